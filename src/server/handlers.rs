use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::browser::BrowserLauncher;
use crate::error::AppResult;
use crate::models::{Gender, TaxIdentifier, VerificationRequest, VerificationResult};
use crate::server::extractors::{extract_json, extract_query};
use crate::server::AppState;
use crate::services::checksum;

/// `POST /api/consultar` 请求体
#[derive(Debug, Deserialize)]
pub struct ConsultaRequest {
    /// 前端预先算好的 CUIT，仅用于比对
    #[serde(default)]
    pub cuit: Option<String>,
    pub dni: String,
    #[serde(default)]
    pub gender: String,
}

/// `POST /api/consultar` 成功响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultaResponse {
    pub ok: bool,
    pub cuit: String,
    pub nombre: String,
    pub es_posible_emitir: bool,
    pub mensajes: Vec<String>,
}

impl ConsultaResponse {
    fn from_result(cuit: &TaxIdentifier, result: VerificationResult) -> Self {
        Self {
            ok: result.ok,
            cuit: cuit.to_string(),
            nombre: result.name,
            es_posible_emitir: result.eligible,
            mensajes: result.reasons,
        }
    }
}

pub async fn consultar<L: BrowserLauncher>(
    State(state): State<AppState<L>>,
    body: Result<Json<ConsultaRequest>, JsonRejection>,
) -> AppResult<Json<ConsultaResponse>> {
    let body = extract_json(body)?;
    let request = VerificationRequest::new(&body.dni, Gender::from_code(&body.gender))?;

    if let Some(client_cuit) = body.cuit.as_deref() {
        let expected = request.cuit.to_string();
        if client_cuit.trim() != expected {
            warn!(
                "前端 CUIT {} 与服务端计算结果 {} 不一致，以服务端为准",
                client_cuit, expected
            );
        }
    }

    info!("📨 查询 CUIT: {}", request.cuit);
    let result = state.orchestrator.verify(&request).await?;

    Ok(Json(ConsultaResponse::from_result(&request.cuit, result)))
}

/// `GET /api/cuit` 查询参数
#[derive(Debug, Deserialize)]
pub struct CuitQuery {
    pub dni: String,
    #[serde(default)]
    pub gender: String,
}

/// CUIT 预览
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CuitPreview {
    pub ok: bool,
    pub cuit: String,
    pub prefijo: String,
    pub documento: String,
    pub digito_verificador: String,
}

/// 只计算 CUIT，不访问门户
pub async fn preview_cuit(
    query: Result<Query<CuitQuery>, QueryRejection>,
) -> AppResult<Json<CuitPreview>> {
    let query = extract_query(query)?;
    let cuit = checksum::compute(&query.dni, Gender::from_code(&query.gender))?;
    let (prefijo, documento, digito_verificador) = cuit.form_parts();

    Ok(Json(CuitPreview {
        ok: true,
        cuit: cuit.to_string(),
        prefijo,
        documento,
        digito_verificador,
    }))
}

pub async fn health() -> &'static str {
    "ok"
}
