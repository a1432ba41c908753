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
        addresses::UpsertAddressRequest,
        auth::{
            CredentialsRequest, GoogleSignInRequest, RefreshResponse, SessionUser, SessionView,
            SignInResponse, SignedInUser,
        },
        banners::{BannerCreated, BannerDeleted, BannerList},
        orders::{
            CreateOrderRequest, DeleteOrderRequest, OrderAddressRequest, OrderDeleted,
            OrderLineRequest, OrderList, OrderView, OrderWithLines, UpdatePaymentStatusRequest,
        },
        products::{ProductCreated, ProductDeleted, ProductList, UpdateProductRequest},
    },
    models::{Address, Banner, Order, OrderLine, Product, User},
    response::{ApiResponse, Meta},
    routes::{addresses, auth, banners, health, orders, params, products},
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
        auth::credentials_callback,
        auth::google_callback,
        auth::refresh,
        auth::session,
        orders::list_orders,
        orders::create_order,
        orders::update_payment_status,
        orders::delete_order,
        banners::list_banners,
        banners::create_banner,
        banners::delete_banner,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        addresses::get_my_address,
        addresses::upsert_my_address
    ),
    components(
        schemas(
            User,
            Address,
            Product,
            Order,
            OrderLine,
            Banner,
            CredentialsRequest,
            GoogleSignInRequest,
            SignedInUser,
            SignInResponse,
            RefreshResponse,
            SessionUser,
            SessionView,
            CreateOrderRequest,
            OrderLineRequest,
            OrderAddressRequest,
            UpdatePaymentStatusRequest,
            DeleteOrderRequest,
            OrderWithLines,
            OrderView,
            OrderList,
            OrderDeleted,
            BannerList,
            BannerCreated,
            BannerDeleted,
            ProductList,
            ProductCreated,
            ProductDeleted,
            UpdateProductRequest,
            UpsertAddressRequest,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithLines>,
            ApiResponse<OrderList>,
            ApiResponse<BannerList>,
            ApiResponse<SignInResponse>,
            ApiResponse<SessionView>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Sign-in and session endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Banners", description = "Storefront banner endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Addresses", description = "Shipping address endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
