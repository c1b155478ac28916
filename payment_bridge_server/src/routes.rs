//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every order platform call is therefore awaited, never blocked on.
use actix_web::{get, http::header, web, HttpRequest, HttpResponse, Responder};
use log::*;
use payment_bridge_engine::{
    payment_objects::{PaymentParams, WebhookDelivery, WebhookOutcome},
    OrderGateway,
    ReconciliationApi,
};
use serde::Deserialize;

use crate::{config::ServerOptions, errors::ServerError, helpers::header_value};

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

//----------------------------------------------   Pay  ----------------------------------------------------
route!(pay => Get "/pay" impl OrderGateway);
/// Creates a pending order for the requested line items and redirects the buyer to the hosted payment page.
///
/// The redirect carries a signed token with the order total and the order id, which the gateway echoes back as
/// its custom reference.
pub async fn pay<G: OrderGateway>(
    params: web::Query<PaymentParams>,
    api: web::Data<ReconciliationApi<G>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💳️ Received payment request");
    let redirect = api.initiate_payment(params.into_inner()).await?;
    debug!(
        "💳️ Redirecting buyer to the payment gateway for order {} ({})",
        redirect.order_id,
        redirect.order_name.as_deref().unwrap_or("unnamed")
    );
    Ok(HttpResponse::Found().insert_header((header::LOCATION, redirect.redirect_url.as_str())).finish())
}

//----------------------------------------------   Confirm  ----------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmParams {
    pub shop: Option<String>,
    #[serde(alias = "customReference", alias = "custom_reference", alias = "reference")]
    pub order_reference: Option<String>,
}

route!(confirm => Get "/confirm" impl OrderGateway);
/// The buyer lands here after paying. They are sent on to their order status page, or to the fallback page if it
/// can't be resolved. This never changes the order's financial state; that only happens via the webhook.
pub async fn confirm<G: OrderGateway>(
    params: web::Query<ConfirmParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<ReconciliationApi<G>>,
) -> HttpResponse {
    trace!("↩️ Received confirmation request");
    let ConfirmParams { shop, order_reference } = params.into_inner();
    let location = match api.confirm_return(shop.as_deref(), order_reference.as_deref()).await {
        Ok(url) => url,
        Err(e) => {
            warn!("↩️ Could not resolve the order status page. Using the fallback. {e}");
            options.confirm_fallback()
        },
    };
    HttpResponse::Found().insert_header((header::LOCATION, location)).finish()
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(webhook => Post "/webhook" impl OrderGateway);
/// Payment notifications from the gateway. The raw body is verified against the signature header before anything
/// else happens.
pub async fn webhook<G: OrderGateway>(
    req: HttpRequest,
    body: web::Bytes,
    options: web::Data<ServerOptions>,
    api: web::Data<ReconciliationApi<G>>,
) -> Result<HttpResponse, ServerError> {
    trace!("🪝️ Received webhook request ({} bytes)", body.len());
    let signature = header_value(&req, &options.signature_header);
    let key_id = header_value(&req, &options.key_id_header);
    let delivery = WebhookDelivery::new(body.to_vec(), signature, key_id);
    match api.process_webhook(delivery).await {
        Ok(WebhookOutcome::Recorded(order_id)) => {
            debug!("🪝️ Webhook for order {order_id} processed");
            Ok(HttpResponse::Ok().body("Webhook processed"))
        },
        Ok(WebhookOutcome::AlreadyProcessed(order_id)) => {
            debug!("🪝️ Webhook for order {order_id} was a redelivery");
            Ok(HttpResponse::Ok().body("Already processed"))
        },
        Err(e) => Err(ServerError::WebhookFailed(e.to_string())),
    }
}
