use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::customers::{CustomerList, RegisterCustomerRequest},
    entity::customers::{
        ActiveModel as CustomerActive, Column, Entity as Customers, Model as CustomerModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Customer,
    phone::normalize_phone,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Format the next sequential customer code given the current maximum.
fn next_code(last: Option<&str>) -> AppResult<String> {
    let last_value = match last {
        Some(code) => code
            .parse::<u32>()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("malformed customer code: {code}")))?,
        None => 0,
    };
    Ok(format!("{:06}", last_value + 1))
}

/// Register a customer for the authenticated account.
///
/// The phone number is normalized before anything touches the database.
/// Code assignment runs under an advisory transaction lock so concurrent
/// registrations cannot read the same maximum and collide.
pub async fn register(
    state: &AppState,
    user: &AuthUser,
    payload: RegisterCustomerRequest,
) -> AppResult<ApiResponse<Customer>> {
    let phone_number = normalize_phone(&payload.phone_number)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let txn = state.orm.begin().await?;

    // Serializes code assignment across concurrent registrations.
    let backend = txn.get_database_backend();
    txn.execute(Statement::from_string(
        backend,
        "SELECT pg_advisory_xact_lock(hashtext('customers_code'))",
    ))
    .await?;

    let existing = Customers::find()
        .filter(Column::UserId.eq(user.user_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "account already has a registered customer".into(),
        ));
    }

    let duplicate = Customers::find()
        .filter(Column::PhoneNumber.eq(phone_number.clone()))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict("phone number already registered".into()));
    }

    let last = Customers::find()
        .order_by_desc(Column::Code)
        .one(&txn)
        .await?;
    let code = next_code(last.as_ref().map(|c| c.code.as_str()))?;

    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        name: Set(payload.name),
        code: Set(code),
        phone_number: Set(phone_number),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Customer registered",
        customer_from_entity(customer),
        Some(Meta::empty()),
    ))
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Customers::find().order_by_asc(Column::Code);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(customer_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(meta),
    ))
}

pub async fn get_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Customer>> {
    ensure_staff(user)?;
    let customer = Customers::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(customer_from_entity);
    match customer {
        Some(c) => Ok(ApiResponse::success("Customer", c, None)),
        None => Err(AppError::NotFound),
    }
}

/// Customer record for the calling account, used by the order workflow.
pub async fn find_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<CustomerModel>> {
    let customer = Customers::find()
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(customer)
}

pub fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        code: model.code,
        phone_number: model.phone_number,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_customer_gets_code_000001() {
        assert_eq!(next_code(None).unwrap(), "000001");
    }

    #[test]
    fn codes_increment_and_stay_zero_padded() {
        assert_eq!(next_code(Some("000001")).unwrap(), "000002");
        assert_eq!(next_code(Some("000099")).unwrap(), "000100");
        assert_eq!(next_code(Some("999998")).unwrap(), "999999");
    }

    #[test]
    fn malformed_code_is_an_internal_error() {
        assert!(next_code(Some("abc")).is_err());
    }
}
