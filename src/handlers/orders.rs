use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::application::AppState;
use crate::domain::coupon::CouponRejection;
use crate::domain::order::{
    Checkout, CheckoutLine, CouponOutcome, Customer, OrderStatus, OrderView, PlacedOrder,
};
use crate::errors::AppError;

use super::{money, validate_not_blank};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CustomerDto {
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 50), custom = "validate_not_blank")]
    pub phone: String,
}

/// Prices are never taken from the client: each line is priced from the
/// catalog at checkout.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate]
    pub lines: Vec<CreateOrderLineRequest>,
    #[validate]
    pub customer: CustomerDto,
    /// Optional seller coupon code, e.g. "ABC123"
    pub coupon_code: Option<String>,
}

impl From<CreateOrderRequest> for Checkout {
    fn from(req: CreateOrderRequest) -> Self {
        Checkout {
            lines: req
                .lines
                .into_iter()
                .map(|l| CheckoutLine {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
            customer: Customer {
                name: req.customer.name.trim().to_string(),
                email: req.customer.email.trim().to_string(),
                phone: req.customer.phone.trim().to_string(),
            },
            coupon_code: req.coupon_code,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub total: String,
    pub customer: CustomerDto,
    pub status: OrderStatus,
    pub seller_coupon_code: Option<String>,
    pub seller_commission: String,
    pub created_at: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        Self {
            id: o.id,
            total: money(&o.total),
            customer: CustomerDto {
                name: o.customer.name,
                email: o.customer.email,
                phone: o.customer.phone,
            },
            status: o.status,
            seller_coupon_code: o.seller_coupon_code,
            seller_commission: money(&o.seller_commission),
            created_at: o.created_at.to_rfc3339(),
            lines: o
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    id: l.id,
                    product_id: l.product_id,
                    product_name: l.product_name,
                    quantity: l.quantity,
                    unit_price: money(&l.unit_price),
                })
                .collect(),
        }
    }
}

/// What became of the coupon code sent with the order.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponOutcomeResponse {
    NotProvided,
    Applied {
        code: String,
        seller_id: Uuid,
        commission: String,
    },
    Ignored {
        code: String,
        reason: CouponRejection,
    },
}

impl From<CouponOutcome> for CouponOutcomeResponse {
    fn from(outcome: CouponOutcome) -> Self {
        match outcome {
            CouponOutcome::NotProvided => CouponOutcomeResponse::NotProvided,
            CouponOutcome::Applied {
                code,
                seller_id,
                commission,
            } => CouponOutcomeResponse::Applied {
                code: code.to_string(),
                seller_id,
                commission: money(&commission),
            },
            CouponOutcome::Ignored { code, reason } => {
                CouponOutcomeResponse::Ignored { code, reason }
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order: OrderResponse,
    pub coupon: CouponOutcomeResponse,
}

impl From<PlacedOrder> for CreateOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order: placed.order.into(),
            coupon: placed.coupon.into(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    pub email: String,
}

fn responses(orders: Vec<OrderView>) -> Vec<OrderResponse> {
    orders.into_iter().map(OrderResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Checkout. Lines are priced from the catalog. A usable coupon credits its
/// seller in the same transaction that stores the order; an unusable one is
/// reported under `coupon` and the order goes through without commission.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = CreateOrderResponse),
        (status = 400, description = "Invalid order"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()?;
    let checkout = Checkout::from(body);

    let placed = web::block(move || state.orders.place_order(checkout)).await??;
    Ok(HttpResponse::Created().json(CreateOrderResponse::from(placed)))
}

/// GET /orders/{id}
///
/// Returns the order together with its order lines.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = web::block(move || state.orders.get(order_id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns a paginated list of orders (without their lines), newest first.
/// Use `page` (1-based) and `limit` to control pagination.
#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || state.orders.list(page, limit)).await??;
    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: responses(result.items),
        total: result.total,
        page,
        limit,
    }))
}

/// PUT /orders/{id}/status
///
/// `pending` orders may become `completed` or `cancelled`; nothing else moves.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body.status;
    let order = web::block(move || state.orders.update_status(order_id, status)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /orders/{id}
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    web::block(move || state.orders.delete(order_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /orders/by-coupon/{code}
///
/// Orders that credited the given coupon, newest first.
#[utoipa::path(
    get,
    path = "/orders/by-coupon/{code}",
    params(("code" = String, Path, description = "Coupon code, e.g. ABC123")),
    responses(
        (status = 200, description = "Orders for the coupon", body = [OrderResponse]),
        (status = 400, description = "Malformed code"),
    ),
    tag = "orders"
)]
pub async fn orders_by_coupon(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let code = path.into_inner();
    let orders = web::block(move || state.orders.by_coupon(&code)).await??;
    Ok(HttpResponse::Ok().json(responses(orders)))
}

/// GET /orders/by-customer?email=
#[utoipa::path(
    get,
    path = "/orders/by-customer",
    params(CustomerQuery),
    responses(
        (status = 200, description = "Orders placed with the email", body = [OrderResponse]),
    ),
    tag = "orders"
)]
pub async fn orders_by_customer(
    state: web::Data<AppState>,
    query: web::Query<CustomerQuery>,
) -> Result<HttpResponse, AppError> {
    let email = query.into_inner().email;
    let orders = web::block(move || state.orders.by_customer(&email)).await??;
    Ok(HttpResponse::Ok().json(responses(orders)))
}
