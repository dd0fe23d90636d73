use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    models::{CreateEmployeeEntity, EmployeeEntity},
    repos::employees,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/employees",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_employee, list_employees))
            .routes(utoipa_axum::routes!(set_employee_active)),
    )
}

#[derive(Deserialize, Debug, ToSchema)]
struct SetActive {
    is_active: bool,
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Employees"],
    request_body = CreateEmployeeEntity,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Employee created", body = StdResponse<EmployeeEntity, String>),
        (status = 400, description = "Missing name or unknown role")
    )
)]
async fn create_employee(
    State(state): State<AppState>,
    Json(body): Json<CreateEmployeeEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let employee = employees::create(conn, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(employee),
            message: Some("Employee created successfully"),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Employees"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Employees", body = StdResponse<Vec<EmployeeEntity>, String>)
    )
)]
async fn list_employees(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let employees = employees::list(conn).await?;

    Ok(StdResponse {
        data: Some(employees),
        message: Some("Get employees successfully"),
    })
}

/// Enable or disable an employee. Employees are never deleted.
#[utoipa::path(
    patch,
    path = "/{id}/active",
    tags = ["Employees"],
    params(("id" = i32, Path, description = "Employee ID")),
    request_body = SetActive,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Employee updated", body = StdResponse<EmployeeEntity, String>),
        (status = 404, description = "Unknown employee")
    )
)]
async fn set_employee_active(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<SetActive>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let employee = employees::set_active(conn, id, body.is_active).await?;

    tracing::info!(employee_id = id, is_active = body.is_active, "employee active flag changed");
    Ok(StdResponse {
        data: Some(employee),
        message: Some("Employee updated successfully"),
    })
}
