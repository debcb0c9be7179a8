use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::services::orders::{
    CreateOrderRequest, OrderResponse, SearchOrdersRequest, UpdateOrderRequest,
};
use crate::{errors::ServiceError, ApiResponse, AppState, PaginatedResponse};
use validator::Validate;

const LISTING_PARAMS: &str = "page_number, size and distribution_id";

/// Parses the raw listing path parameters, mirroring the two-step
/// validation the API contract requires: numeric first, then positive.
fn parse_listing_params(
    page_number: &str,
    size: &str,
    distribution_id: &str,
) -> Result<SearchOrdersRequest, ServiceError> {
    let page_number: i64 = page_number
        .parse()
        .map_err(|_| ServiceError::ParametersMustBeNumbers(LISTING_PARAMS.to_string()))?;
    let size: i64 = size
        .parse()
        .map_err(|_| ServiceError::ParametersMustBeNumbers(LISTING_PARAMS.to_string()))?;
    let distribution_id: i64 = distribution_id
        .parse()
        .map_err(|_| ServiceError::ParametersMustBeNumbers(LISTING_PARAMS.to_string()))?;

    if page_number <= 0 || size <= 0 || distribution_id <= 0 {
        return Err(ServiceError::ParametersMustBePositive(
            LISTING_PARAMS.to_string(),
        ));
    }

    Ok(SearchOrdersRequest {
        page_number: page_number as u64,
        size: size as u64,
        distribution_id,
    })
}

fn validation_error_messages(validation_errors: validator::ValidationErrors) -> Vec<String> {
    validation_errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            let field = field.to_string();
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error.message.as_ref().unwrap_or(&"Invalid value".into())
                )
            })
        })
        .collect()
}

/// List orders for a distribution with pagination
#[utoipa::path(
    get,
    path = "/api/v1/orders/find-all/{page_number}/{size}/{distribution_id}",
    summary = "List orders",
    description = "Get a page of active orders for a distribution",
    params(
        ("page_number" = String, Path, description = "1-based page number (positive integer)"),
        ("size" = String, Path, description = "Page size (positive integer)"),
        ("distribution_id" = String, Path, description = "Distribution identifier (positive integer)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<PaginatedResponse<OrderResponse>>),
        (status = 400, description = "Non-numeric or non-positive parameters", body = crate::errors::ErrorResponse),
        (status = 404, description = "Distribution not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn find_all_orders(
    State(state): State<AppState>,
    Path((page_number, size, distribution_id)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let search = parse_listing_params(&page_number, &size, &distribution_id)?;

    let result = state.services.order.get_orders(search).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.orders,
        total: result.total,
        page: result.page,
        limit: result.size,
        total_pages: result.total_pages,
    })))
}

/// Create a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Create a new pre-sale order for a customer in a distribution",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or distribution not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Active order already exists for the pair", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(validation_error_messages(
                validation_errors,
            ))),
        ));
    }

    let order = state.services.order.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Update an order
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    summary = "Update order",
    description = "Replace an order's customer, distribution and amount",
    params(("id" = i64, Path, description = "Order identifier")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated successfully", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    if let Err(validation_errors) = request.validate() {
        return Err(ServiceError::ValidationError(
            validation_error_messages(validation_errors).join("; "),
        ));
    }

    let order = state.services.order.update_order(id, request).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Delete an order
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    summary = "Delete order",
    description = "Soft-delete an order; returns its last visible state",
    params(("id" = i64, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "Order deleted successfully", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.order.delete_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}
