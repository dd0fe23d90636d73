use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    core::{app_error::AppError, middleware::ADMIN_ROLE},
    models::{CreateEmployeeEntity, EmployeeEntity},
    schema::employees,
};

pub const STAFF_ROLE: &str = "staff";

pub async fn create(
    conn: &mut AsyncPgConnection,
    new_employee: CreateEmployeeEntity,
) -> Result<EmployeeEntity, AppError> {
    if new_employee.name.trim().is_empty() {
        return Err(AppError::bad_request("Employee name must not be empty"));
    }
    if ![ADMIN_ROLE, STAFF_ROLE].contains(&new_employee.role.as_str()) {
        return Err(AppError::bad_request(format!(
            "{} is not a valid role",
            new_employee.role
        )));
    }

    let employee = diesel::insert_into(employees::table)
        .values(new_employee)
        .returning(EmployeeEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create employee")?;

    Ok(employee)
}

pub async fn get(conn: &mut AsyncPgConnection, id: i32) -> Result<EmployeeEntity, AppError> {
    employees::table
        .find(id)
        .select(EmployeeEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Employee #{id}")))
}

/// The employee must exist and must not be disabled.
pub async fn require_active(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<EmployeeEntity, AppError> {
    let employee = get(conn, id).await?;
    if !employee.is_active {
        return Err(AppError::invalid_state(format!(
            "Employee #{id} is not active"
        )));
    }
    Ok(employee)
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<EmployeeEntity>, AppError> {
    let employees = employees::table
        .select(EmployeeEntity::as_select())
        .order_by(employees::name.asc())
        .load(conn)
        .await
        .context("Failed to list employees")?;

    Ok(employees)
}

pub async fn set_active(
    conn: &mut AsyncPgConnection,
    id: i32,
    is_active: bool,
) -> Result<EmployeeEntity, AppError> {
    diesel::update(employees::table.find(id))
        .set(employees::is_active.eq(is_active))
        .returning(EmployeeEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Employee #{id}")))
}
