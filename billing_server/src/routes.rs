//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module
//! neat and tidy 🙏
//!
//! Handlers are generic over the database trait so that endpoint tests can substitute a mock,
//! and the routes are registered through the `route!` macro because actix cannot infer generics
//! in handlers on its own.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use billing_engine::{db_types::TransactionStatus, BillingDatabase, TransactionApi};
use log::*;
use serde_json::json;

use crate::{
    auth::JwtClaims,
    data_objects::{ApiResponse, CreateTransactionRequest, UpdateStatusRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//-----------------------------------------  Create transaction  -----------------------------------------------
route!(create_transaction => Post "/transactions" impl BillingDatabase);
/// Registers a new transaction against an invoice. The amount is snapshotted from the invoice
/// total by the engine; clients cannot supply it.
pub async fn create_transaction<B>(
    claims: JwtClaims,
    body: web::Json<CreateTransactionRequest>,
    api: web::Data<TransactionApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BillingDatabase,
{
    trace!("💻️ POST transaction for invoice #{}", body.invoice_id);
    let view = api.create_transaction(&claims.identity(), body.invoice_id).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new("Transaction registered successfully.", json!(view))))
}

//-----------------------------------------  Transaction history  ----------------------------------------------
route!(transaction_history => Get "/transactions" impl BillingDatabase);
/// Staff see every transaction; everyone else only those on their own invoices.
pub async fn transaction_history<B>(
    claims: JwtClaims,
    api: web::Data<TransactionApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BillingDatabase,
{
    trace!("💻️ GET transaction history for user #{}", claims.user_id);
    let history = api.transaction_history(&claims.identity()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new("Transaction history retrieved successfully.", json!(history))))
}

//----------------------------------------  Transaction by id  -------------------------------------------------
route!(transaction_by_id => Get "/transactions/{id}" impl BillingDatabase);
pub async fn transaction_by_id<B>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<TransactionApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BillingDatabase,
{
    let id = path.into_inner();
    trace!("💻️ GET transaction #{id} for user #{}", claims.user_id);
    let view = api.fetch_transaction(&claims.identity(), id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new("Transaction retrieved successfully.", json!(view))))
}

//----------------------------------------  Update transaction status  -----------------------------------------
route!(update_transaction_status => Patch "/transactions/{id}/status" impl BillingDatabase);
/// Drives the transaction state machine. A string that is not a status at all is a validation
/// error; a status the state machine rejects comes back as one too, with the engine's reason.
pub async fn update_transaction_status<B>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
    api: web::Data<TransactionApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BillingDatabase,
{
    let id = path.into_inner();
    trace!("💻️ PATCH transaction #{id} status to {}", body.status);
    let new_status = TransactionStatus::from_str(&body.status)
        .map_err(|_| ServerError::validation("status", format!("\"{}\" is not a valid choice.", body.status)))?;
    let view = api.update_status(&claims.identity(), id, new_status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new("Transaction status updated successfully.", json!(view))))
}
