use std::sync::Arc;

use graphql_parser::parse_query;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::ShopifyConfig,
    helpers::order_gid,
    NewShopifyOrder,
    NewShopifyTransaction,
    ShopifyApiError,
    ShopifyOrder,
    ShopifyTransaction,
};

const ORDER_STATUS_PAGE_QUERY: &str = "query getOrderStatusUrl($id: ID!) { order(id: $id) { statusPageUrl } }";

#[derive(Clone)]
pub struct ShopifyApi {
    config: ShopifyConfig,
    client: Arc<Client>,
}

impl ShopifyApi {
    pub fn new(config: ShopifyConfig) -> Result<Self, ShopifyApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.admin_access_token.reveal().as_str())
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        headers.insert("X-Shopify-Access-Token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn shop(&self) -> &str {
        self.config.shop.as_str()
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, ShopifyApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| ShopifyApiError::RestRequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
            Err(ShopifyApiError::QueryError { status, message })
        }
    }

    pub async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T, ShopifyApiError> {
        let body = graphql_body(query, variables)?;
        trace!("Sending GraphQL query: {body}");
        let result = self.rest_query::<Value, Value>(Method::POST, "/graphql.json", &[], Some(body)).await?;
        if let Some(errors) = result["errors"].as_array() {
            let e = errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join(", ");
            return Err(ShopifyApiError::GraphQLError(e));
        }
        let data = result["data"].clone();
        let costs = result["extensions"]["cost"].clone();
        trace!("GraphQL response: {data}");
        trace!("GraphQL costs: {costs}");
        if data.is_null() {
            return Err(ShopifyApiError::EmptyResponse);
        }
        let result = serde_json::from_value(data).map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        Ok(result)
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}/admin/api/{}{path}", self.config.shop, self.config.api_version)
    }

    pub async fn get_order(&self, order_id: u64) -> Result<ShopifyOrder, ShopifyApiError> {
        #[derive(Deserialize)]
        struct OrderResponse {
            order: ShopifyOrder,
        }
        let path = format!("/orders/{order_id}.json");
        debug!("Fetching order #{order_id}");
        let result = self.rest_query::<OrderResponse, ()>(Method::GET, &path, &[], None).await?;
        info!("Fetched order #{order_id}");
        Ok(result.order)
    }

    pub async fn create_order(&self, order: NewShopifyOrder) -> Result<ShopifyOrder, ShopifyApiError> {
        #[derive(Serialize)]
        struct OrderInput {
            order: NewShopifyOrder,
        }
        #[derive(Deserialize)]
        struct OrderResponse {
            order: ShopifyOrder,
        }
        debug!("Creating order with {} line item(s)", order.line_items.len());
        let input = OrderInput { order };
        let result =
            self.rest_query::<OrderResponse, OrderInput>(Method::POST, "/orders.json", &[], Some(input)).await?;
        let order = result.order;
        info!("Created order #{} ({}). Total: {} {}", order.id, order.name, order.total_price, order.currency);
        Ok(order)
    }

    pub async fn create_transaction(
        &self,
        order_id: u64,
        transaction: NewShopifyTransaction,
    ) -> Result<ShopifyTransaction, ShopifyApiError> {
        #[derive(Serialize)]
        struct TransactionInput {
            transaction: NewShopifyTransaction,
        }
        #[derive(Deserialize)]
        struct TransactionResponse {
            transaction: ShopifyTransaction,
        }
        let path = format!("/orders/{order_id}/transactions.json");
        debug!(
            "Posting {} transaction of {} {} to order #{order_id}",
            transaction.kind, transaction.amount, transaction.currency
        );
        let input = TransactionInput { transaction };
        let result =
            self.rest_query::<TransactionResponse, TransactionInput>(Method::POST, &path, &[], Some(input)).await?;
        Ok(result.transaction)
    }

    /// Returns the customer-facing order status ("thank you") page, or `None` if the order does not exist or has no
    /// status page yet.
    pub async fn fetch_order_status_page_url(&self, order_id: u64) -> Result<Option<String>, ShopifyApiError> {
        #[derive(Deserialize)]
        struct StatusPage {
            #[serde(rename = "statusPageUrl")]
            status_page_url: Option<String>,
        }
        #[derive(Deserialize)]
        struct OrderStatusResponse {
            order: Option<StatusPage>,
        }
        let variables = serde_json::json!({ "id": order_gid(order_id) });
        let result = self.graphql_query::<OrderStatusResponse>(ORDER_STATUS_PAGE_QUERY, Some(variables)).await?;
        Ok(result.order.and_then(|o| o.status_page_url))
    }
}

/// Validates the query locally before building the request body, so that malformed queries never leave the process.
fn graphql_body(query: &str, variables: Option<Value>) -> Result<Value, ShopifyApiError> {
    let query = parse_query::<String>(query).map_err(|e| ShopifyApiError::InvalidGraphQL(e.to_string()))?;
    let mut body = serde_json::json!({
        "query": query.to_string(),
    });
    if let Some(vars) = variables {
        body["variables"] = vars;
    }
    Ok(body)
}
