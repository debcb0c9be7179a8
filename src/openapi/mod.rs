use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presale API",
        version = "0.1.0",
        description = r#"
# Pre-sale Order Management API

An API for managing pre-sale orders placed by customers against
distribution rounds.

## Features

- **Order listing**: Paginated listing of active orders per distribution
- **Order management**: Create, update, and soft-delete pre-sale orders
- **Served tracking**: Zero-amount orders mark the customer as served

## Error Handling

The API uses a consistent error response format carrying a
machine-readable domain code and appropriate HTTP status:

```json
{
  "error": "Not Found",
  "code": "DISTRIBUTION_NOT_FOUND",
  "message": "No distribution exists with id 42",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Pre-sale order management endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::orders::find_all_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::delete_order,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::services::orders::OrderResponse,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::UpdateOrderRequest,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
