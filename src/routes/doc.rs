use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        customers::{CustomerList, RegisterCustomerRequest},
        inventory::{CreateItemRequest, ItemList, UpdateItemRequest},
        orders::{
            OrderLineRequest, OrderList, OrderReceipt, OrderWithItems, PlaceOrderRequest,
            UpdateOrderStatusRequest,
        },
    },
    models::{Customer, InventoryItem, Order, OrderItem, OrderStatus, SentSms, StockState, User},
    response::{ApiResponse, Meta},
    routes::{admin, customers, health, inventory, orders, params},
    services::admin_service::SmsLogList,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        customers::register,
        customers::list_customers,
        customers::get_customer,
        inventory::list_items,
        inventory::get_item,
        inventory::create_item,
        inventory::update_item,
        inventory::delete_item,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::list_sms_log,
    ),
    components(
        schemas(
            User,
            Customer,
            InventoryItem,
            Order,
            OrderItem,
            OrderStatus,
            StockState,
            SentSms,
            RegisterCustomerRequest,
            CustomerList,
            CreateItemRequest,
            UpdateItemRequest,
            ItemList,
            PlaceOrderRequest,
            OrderLineRequest,
            OrderReceipt,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            SmsLogList,
            params::Pagination,
            params::ItemQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Customer>,
            ApiResponse<InventoryItem>,
            ApiResponse<ItemList>,
            ApiResponse<OrderReceipt>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<SmsLogList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Customers", description = "Customer registration and directory"),
        (name = "Inventory", description = "Inventory item endpoints"),
        (name = "Orders", description = "Order placement and history"),
        (name = "Admin", description = "Staff-only endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
