// tests/api_endpoints.rs
//! REST API behavior over the sample data, driven through real HTTP.

mod common;

use common::{spawn_mock_server, spawn_server};
use obra_partes::{AppState, CorsPolicy, MockWorkOrders, WorkOrderRepository};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

async fn get_json(url: &str) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn health_reports_mock_mode() {
    let server = spawn_mock_server().await;
    let (status, body) = get_json(&format!("{}/api/health", server.base_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mode"], "mock");
    assert_eq!(body["notionToken"], "mock");
}

#[tokio::test]
async fn reference_listings() {
    let server = spawn_mock_server().await;
    let base = &server.base_url;

    let (_, obras) = get_json(&format!("{base}/api/obras")).await;
    assert_eq!(obras.as_array().unwrap().len(), 3);
    assert_eq!(obras[0]["nombre"], "Reforma Sede Central");

    let (_, jefes) = get_json(&format!("{base}/api/jefes-obra")).await;
    assert_eq!(jefes.as_array().unwrap().len(), 3);

    let (_, empleados) = get_json(&format!("{base}/api/empleados")).await;
    assert_eq!(empleados.as_array().unwrap().len(), 5);

    let (_, de_obra) = get_json(&format!("{base}/api/obras/obra-1/empleados")).await;
    let names: Vec<&str> = de_obra
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["nombre"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ana Gómez", "Carlos Martín"]);

    let (_, opciones) = get_json(&format!("{base}/api/empleados/estado-opciones")).await;
    assert_eq!(opciones["type"], "status");
    assert_eq!(opciones["options"][0], json!({ "name": "Activo", "color": "green" }));
}

#[tokio::test]
async fn partes_listing_and_filters() {
    let server = spawn_mock_server().await;
    let base = &server.base_url;

    let (status, partes) = get_json(&format!("{base}/api/partes-trabajo")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = partes
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["parte-2", "parte-1"]);
    assert_eq!(partes[1]["rpHorasTotales"], 16.0);

    let (_, por_obra) = get_json(&format!(
        "{base}/api/partes-trabajo?obra=Reforma%20Sede%20Central"
    ))
    .await;
    assert_eq!(por_obra.as_array().unwrap().len(), 1);

    let (_, por_fecha) = get_json(&format!("{base}/api/partes-trabajo?fecha=2024-03-12")).await;
    assert_eq!(por_fecha[0]["id"], "parte-2");

    let (status, error) = get_json(&format!("{base}/api/partes-trabajo?fecha=ayer")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn parte_reads() {
    let server = spawn_mock_server().await;
    let base = &server.base_url;

    let (_, empleados) = get_json(&format!("{base}/api/partes-trabajo/parte-1/empleados")).await;
    assert_eq!(empleados.as_array().unwrap().len(), 2);
    assert_eq!(empleados[0]["empleadoNombre"], "Ana Gómez");
    assert_eq!(empleados[0]["horas"], 8.0);

    let (_, detalle) = get_json(&format!("{base}/api/partes-trabajo/parte-1/detalles")).await;
    assert_eq!(detalle["parte"]["estado"], "Borrador");
    assert_eq!(detalle["parte"]["obra"], "Reforma Sede Central");
    assert_eq!(detalle["empleados"].as_array().unwrap().len(), 2);

    let (_, estado) = get_json(&format!("{base}/api/partes-trabajo/parte-2/estado")).await;
    assert_eq!(
        estado,
        json!({ "estado": "Firmado", "ultimaEdicion": "2024-03-12T15:30:00.000Z" })
    );

    let (status, missing) = get_json(&format!("{base}/api/partes-trabajo/parte-9/estado")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["code"], "NOT_FOUND");

    let (status, bad_id) = get_json(&format!("{base}/api/partes-trabajo/bad%20id/estado")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_requires_fields() {
    let server = spawn_mock_server().await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/partes-trabajo", server.base_url))
        .json(&json!({ "obra": "Reforma Sede Central", "fecha": "2024-04-02" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Faltan campos requeridos");
    assert_eq!(
        body["required"],
        json!(["obra", "obraId", "fecha", "jefeObraId"])
    );
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let server = spawn_mock_server().await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/partes-trabajo", server.base_url))
        .header("content-type", "application/json")
        .body("{\"obra\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_update_and_send_a_parte() {
    let server = spawn_mock_server().await;
    let base = &server.base_url;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/partes-trabajo"))
        .json(&json!({
            "obra": "Reforma Sede Central",
            "obraId": "obra-1",
            "fecha": "2024-04-02",
            "jefeObraId": "jefe-1",
            "notas": "  Replanteo\u{0007} ",
            "empleados": ["empleado-1", "empleado-2", "empleado-77"],
            "empleadosHoras": { "empleado-1": 6, "empleado-2": "4.5" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["estado"], "Borrador");
    assert_eq!(created["notas"], "Replanteo");
    assert_eq!(created["empleadosAsignados"], 3);
    assert_eq!(created["detallesCreados"], 2);
    assert_eq!(created["erroresDetalles"], 1);
    assert_eq!(created["rpHorasTotales"], 10.5);
    assert_eq!(
        created["mensaje"],
        "Parte creado exitosamente. 2 empleados asignados."
    );
    let id = created["id"].as_str().unwrap().to_string();

    let (_, partes) = get_json(&format!("{base}/api/partes-trabajo")).await;
    assert_eq!(partes[0]["id"], id.as_str());

    let response = client
        .put(format!("{base}/api/partes-trabajo/{id}"))
        .json(&json!({ "notas": "Replanteo final", "empleados": ["empleado-1"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["notas"], "Replanteo final");
    assert_eq!(updated["rpHorasTotales"], 8.0);

    let response = client
        .post(format!("{base}/api/partes-trabajo/{id}/enviar-datos"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sent: Value = response.json().await.unwrap();
    assert_eq!(sent["parte"]["estado"], "Datos Enviados");
    assert_eq!(sent["payload"]["parteId"], id.as_str());
    assert_eq!(sent["payload"]["data"]["estado"], "Borrador");
    assert_eq!(sent["payload"]["source"]["action"], "enviar-datos");

    let response = client
        .post(format!("{base}/api/partes-trabajo/{id}/enviar-datos"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_STATE");
    assert_eq!(body["estado"], "Datos Enviados");

    let response = client
        .put(format!("{base}/api/partes-trabajo/{id}"))
        .json(&json!({ "notas": "otra" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_EDITABLE");
}

#[tokio::test]
async fn employee_estado_updates() {
    let server = spawn_mock_server().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/empleados/empleado-3/estado", server.base_url);

    let response = client
        .patch(&url)
        .json(&json!({ "estado": "activo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let employee: Value = response.json().await.unwrap();
    assert_eq!(employee["estado"], "Activo");

    let response = client.patch(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .patch(&url)
        .json(&json!({ "estado": "Vacaciones" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].as_str().unwrap().contains("Activo"));
}

#[tokio::test]
async fn complete_data_and_unknown_routes() {
    let server = spawn_mock_server().await;
    let (status, data) = get_json(&format!("{}/api/datos-completos", server.base_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["obras"].as_array().unwrap().len(), 3);
    assert_eq!(data["jefesObra"].as_array().unwrap().len(), 3);
    assert_eq!(data["empleados"].as_array().unwrap().len(), 5);
    assert_eq!(data["partesTrabajo"].as_array().unwrap().len(), 2);

    let (status, body) = get_json(&format!("{}/api/no-existe", server.base_url)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let server = spawn_mock_server().await;
    let notes = "x".repeat(100 * 1024);
    let response = reqwest::Client::new()
        .post(format!("{}/api/partes-trabajo", server.base_url))
        .json(&json!({ "notas": notes }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_allow_list() {
    let repo: Arc<dyn WorkOrderRepository> = Arc::new(MockWorkOrders::default());
    let state = AppState::new(repo)
        .with_rate_limit(0)
        .with_cors(CorsPolicy::AllowList(vec!["http://obra.test".into()]));
    let server = spawn_server(state).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/obras", server.base_url);

    let preflight = client
        .request(reqwest::Method::OPTIONS, &url)
        .header("origin", "http://obra.test")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        preflight.headers()["access-control-allow-origin"],
        "http://obra.test"
    );
    assert!(preflight.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("PATCH"));

    let foreign = client
        .get(&url)
        .header("origin", "http://otro.test")
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::OK);
    assert!(foreign.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn clients_are_rate_limited() {
    let repo: Arc<dyn WorkOrderRepository> = Arc::new(MockWorkOrders::default());
    let server = spawn_server(AppState::new(repo).with_rate_limit(2)).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/health", server.base_url);

    for _ in 0..2 {
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let limited = client.get(&url).send().await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key("retry-after"));

    let other = client
        .get(&url)
        .header("x-forwarded-for", "10.1.2.3")
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

/// Reads SSE chunks until `needle` shows up or the deadline passes.
async fn read_until(response: &mut reqwest::Response, buffer: &mut String, needle: &str) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !buffer.contains(needle) {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, response.chunk()).await {
            Ok(Ok(Some(chunk))) => buffer.push_str(&String::from_utf8_lossy(&chunk)),
            _ => return false,
        }
    }
    true
}

#[tokio::test]
async fn estado_events_stream_changes() {
    let mock = Arc::new(MockWorkOrders::default());
    let repo: Arc<dyn WorkOrderRepository> = mock.clone();
    let state = AppState::new(repo)
        .with_rate_limit(0)
        .with_events_interval(Duration::from_millis(50));
    let server = spawn_server(state).await;

    let (status, _) = get_json(&format!(
        "{}/api/partes-trabajo/parte-9/eventos",
        server.base_url
    ))
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut response = reqwest::get(format!(
        "{}/api/partes-trabajo/parte-1/eventos",
        server.base_url
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let mut buffer = String::new();
    assert!(read_until(&mut response, &mut buffer, "Borrador").await);
    assert!(buffer.contains("event: estado"));

    let parte = obra_partes::RecordId::parse("parte-1").unwrap();
    mock.send_work_order_data(&parte).await.unwrap();
    assert!(read_until(&mut response, &mut buffer, "Datos Enviados").await);
}
