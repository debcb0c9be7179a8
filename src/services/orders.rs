use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity},
    entities::distribution::{self, Entity as DistributionEntity},
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request/Response types for the order service
#[derive(Debug, Clone, Copy)]
pub struct SearchOrdersRequest {
    /// 1-based page number
    pub page_number: u64,
    pub size: u64,
    pub distribution_id: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub distribution_id: i64,
    #[validate(range(min = 0, message = "Amount must not be negative"))]
    pub amount: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderRequest {
    pub customer_id: i64,
    pub distribution_id: i64,
    #[validate(range(min = 0, message = "Amount must not be negative"))]
    pub amount: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_id: i64,
    pub distribution_id: i64,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderPageResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
}

/// Total page count as ceil(total / size).
pub(crate) fn total_pages(total: u64, size: u64) -> u64 {
    if size == 0 {
        return 0;
    }
    (total + size - 1) / size
}

/// Service for managing pre-sale orders against the relational store
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists active orders for a distribution, one page at a time
    #[instrument(skip(self), fields(distribution_id = %search.distribution_id, page = %search.page_number))]
    pub async fn get_orders(
        &self,
        search: SearchOrdersRequest,
    ) -> Result<OrderPageResponse, ServiceError> {
        let db = &*self.db_pool;

        self.find_active_distribution(search.distribution_id)
            .await?;

        let paginator = OrderEntity::find()
            .filter(order::Column::DistributionId.eq(search.distribution_id))
            .filter(order::Column::DeletedAt.is_null())
            .order_by_asc(order::Column::CreatedAt)
            .paginate(db, search.size);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;

        let orders = paginator
            .fetch_page(search.page_number - 1)
            .await
            .map_err(|e| {
                error!(error = %e, page = search.page_number, size = search.size, "Failed to fetch orders page");
                ServiceError::DatabaseError(e)
            })?;

        let order_responses: Vec<OrderResponse> = orders
            .into_iter()
            .map(|order| self.model_to_response(order))
            .collect();

        info!(
            total = total,
            page = search.page_number,
            size = search.size,
            returned_count = order_responses.len(),
            "Orders listed successfully"
        );

        Ok(OrderPageResponse {
            orders: order_responses,
            total,
            page: search.page_number,
            size: search.size,
            total_pages: total_pages(total, search.size),
        })
    }

    /// Creates a new pre-sale order
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, distribution_id = %request.distribution_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let customer = CustomerEntity::find()
            .filter(customer::Column::Id.eq(request.customer_id))
            .filter(customer::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, customer_id = request.customer_id, "Failed to look up customer");
                ServiceError::DatabaseError(e)
            })?;
        if customer.is_none() {
            return Err(ServiceError::CustomerNotFound(request.customer_id));
        }

        self.find_active_distribution(request.distribution_id)
            .await?;

        let existing = OrderEntity::find()
            .filter(order::Column::CustomerId.eq(request.customer_id))
            .filter(order::Column::DistributionId.eq(request.distribution_id))
            .filter(order::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to look up existing order");
                ServiceError::DatabaseError(e)
            })?;
        if existing.is_some() {
            return Err(ServiceError::ExistingOrder {
                customer_id: request.customer_id,
                distribution_id: request.distribution_id,
            });
        }

        let now = Utc::now();
        let order_active_model = OrderActiveModel {
            customer_id: Set(request.customer_id),
            distribution_id: Set(request.distribution_id),
            amount: Set(request.amount),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
            ..Default::default()
        };

        let order_model = order_active_model.insert(db).await.map_err(|e| {
            error!(error = %e, customer_id = request.customer_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        // Separate round-trip; a crash between the insert and this write
        // leaves the flag unset.
        self.mark_customer_served(order_model.customer_id, order_model.amount, order_model.id)
            .await?;

        info!(order_id = order_model.id, customer_id = request.customer_id, "Order created successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_model.id)).await {
                warn!(error = %e, order_id = order_model.id, "Failed to send order created event");
            }
        }

        Ok(self.model_to_response(order_model))
    }

    /// Replaces an order's non-key fields
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: i64,
        request: UpdateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let order = self.find_active_order(order_id).await?;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.customer_id = Set(request.customer_id);
        order_active_model.distribution_id = Set(request.distribution_id);
        order_active_model.amount = Set(request.amount);
        order_active_model.updated_at = Set(Some(Utc::now()));

        let updated_order = order_active_model.update(db).await.map_err(|e| {
            error!(error = %e, order_id = order_id, "Failed to update order");
            ServiceError::DatabaseError(e)
        })?;

        // Re-applied against the updated values, as on create.
        self.mark_customer_served(updated_order.customer_id, updated_order.amount, updated_order.id)
            .await?;

        info!(order_id = order_id, "Order updated successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderUpdated(order_id)).await {
                warn!(error = %e, order_id = order_id, "Failed to send order updated event");
            }
        }

        Ok(self.model_to_response(updated_order))
    }

    /// Soft-deletes an order and returns its last visible state
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: i64) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order = self.find_active_order(order_id).await?;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.deleted_at = Set(Some(Utc::now()));

        let deleted_order = order_active_model.update(db).await.map_err(|e| {
            error!(error = %e, order_id = order_id, "Failed to delete order");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = order_id, "Order deleted successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderDeleted(order_id)).await {
                warn!(error = %e, order_id = order_id, "Failed to send order deleted event");
            }
        }

        Ok(self.model_to_response(deleted_order))
    }

    /// Flips the customer's served flag when a zero-amount pre-sale is
    /// recorded. Nothing ever resets the flag to false.
    async fn mark_customer_served(
        &self,
        customer_id: i64,
        amount: i32,
        order_id: i64,
    ) -> Result<(), ServiceError> {
        if amount != 0 {
            return Ok(());
        }

        let db = &*self.db_pool;

        let customer = CustomerEntity::find()
            .filter(customer::Column::Id.eq(customer_id))
            .filter(customer::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, customer_id = customer_id, "Failed to look up customer for served flag");
                ServiceError::DatabaseError(e)
            })?
            .ok_or(ServiceError::CustomerNotFound(customer_id))?;

        let mut customer_active_model: customer::ActiveModel = customer.into();
        customer_active_model.is_served = Set(true);
        customer_active_model.updated_at = Set(Some(Utc::now()));

        customer_active_model.update(db).await.map_err(|e| {
            error!(error = %e, customer_id = customer_id, "Failed to set served flag");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = customer_id, order_id = order_id, "Customer marked as served");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::CustomerServed {
                    customer_id,
                    order_id,
                })
                .await
            {
                warn!(error = %e, customer_id = customer_id, "Failed to send customer served event");
            }
        }

        Ok(())
    }

    async fn find_active_order(&self, order_id: i64) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;

        OrderEntity::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = order_id, "Failed to look up order");
                ServiceError::DatabaseError(e)
            })?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    async fn find_active_distribution(
        &self,
        distribution_id: i64,
    ) -> Result<distribution::Model, ServiceError> {
        let db = &*self.db_pool;

        DistributionEntity::find()
            .filter(distribution::Column::Id.eq(distribution_id))
            .filter(distribution::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, distribution_id = distribution_id, "Failed to look up distribution");
                ServiceError::DatabaseError(e)
            })?
            .ok_or(ServiceError::DistributionNotFound(distribution_id))
    }

    /// Converts an order model to response format, stripping audit fields
    fn model_to_response(&self, model: OrderModel) -> OrderResponse {
        OrderResponse {
            id: model.id,
            customer_id: model.customer_id,
            distribution_id: model.distribution_id,
            amount: model.amount,
            created_at: model.created_at,
        }
    }
}
