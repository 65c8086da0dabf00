//! HTTP client for the BillDesk API.
//!
//! One method per endpoint. Requests are independent: no retries, no
//! backoff, no ordering between calls. A 401/403 anywhere ends the session.

use std::sync::{Mutex, PoisonError};

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use billdesk_auth::{Role, UserId};
use billdesk_billing::RecurringPlanId;
use billdesk_core::DomainError;
use billdesk_customers::CustomerId;
use billdesk_invoicing::{InvoiceId, InvoiceStatus};
use billdesk_orders::OrderId;
use billdesk_pricelist::{LineDraft, PriceListItemId};

use crate::config::ClientConfig;
use crate::dto::*;
use crate::error::{error_message, ApiError};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
    token: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            token: Mutex::new(config.token),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_session(&self) -> bool {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current_token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "api request");
        let req = self.http.request(method, url);
        match self.current_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send and map every non-2xx status to an [`ApiError`].
    async fn execute(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = status.as_u16(), "session expired; dropping token");
            self.clear_token();
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body);
            tracing::warn!(status = status.as_u16(), %message, "api error");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.execute(req).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn empty(&self, req: RequestBuilder) -> Result<(), ApiError> {
        self.execute(req).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.json(self.request(Method::GET, path)).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json(self.request(method, path).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.empty(self.request(Method::DELETE, path)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = LoginRequest {
            email: email.trim().to_lowercase(),
            password: password.to_string(),
        };
        // Not routed through `execute`: a 401 here means bad credentials, not
        // an expired session.
        let resp = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let message = error_message(&resp.text().await.unwrap_or_default());
            tracing::warn!(status = status.as_u16(), %message, "login rejected");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let bytes = resp.bytes().await?;
        let login: LoginResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.set_token(login.token);
        tracing::info!("logged in");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn list_customers(&self) -> Result<Vec<CustomerDto>, ApiError> {
        self.get("/api/customers").await
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<CustomerDto, ApiError> {
        self.get(&format!("/api/customers/{id}")).await
    }

    pub async fn create_customer(&self, input: &CustomerInput) -> Result<CustomerDto, ApiError> {
        self.send_json(Method::POST, "/api/customers", input).await
    }

    pub async fn update_customer(
        &self,
        id: CustomerId,
        input: &CustomerInput,
    ) -> Result<CustomerDto, ApiError> {
        self.send_json(Method::PUT, &format!("/api/customers/{id}"), input).await
    }

    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), ApiError> {
        self.delete(&format!("/api/customers/{id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Orders
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn list_orders(&self) -> Result<Vec<OrderDto>, ApiError> {
        self.get("/api/orders").await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<OrderDto, ApiError> {
        self.get(&format!("/api/orders/{id}")).await
    }

    pub async fn create_order(&self, input: &OrderInput) -> Result<OrderDto, ApiError> {
        validate_lines(&input.items)?;
        self.send_json(Method::POST, "/api/orders", input).await
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<(), ApiError> {
        self.delete(&format!("/api/orders/{id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Price list
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn list_price_list(&self) -> Result<Vec<PriceListItemDto>, ApiError> {
        self.get("/api/price-list").await
    }

    pub async fn create_price_list_item(
        &self,
        input: &PriceListItemInput,
    ) -> Result<PriceListItemDto, ApiError> {
        self.send_json(Method::POST, "/api/price-list", input).await
    }

    pub async fn update_price_list_item(
        &self,
        id: PriceListItemId,
        input: &PriceListItemInput,
    ) -> Result<PriceListItemDto, ApiError> {
        self.send_json(Method::PUT, &format!("/api/price-list/{id}"), input).await
    }

    pub async fn set_price_list_item_active(
        &self,
        id: PriceListItemId,
        active: bool,
    ) -> Result<PriceListItemDto, ApiError> {
        self.send_json(Method::PATCH, &format!("/api/price-list/{id}/active"), &ActiveFlag { active })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invoices
    // ─────────────────────────────────────────────────────────────────────────

    /// One page of `GET /api/invoices/paged`, optionally filtered by status.
    pub async fn list_invoices_page(
        &self,
        page: u32,
        size: u32,
        status: Option<InvoiceStatus>,
    ) -> Result<Page<InvoiceDto>, ApiError> {
        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        self.json(self.request(Method::GET, "/api/invoices/paged").query(&query))
            .await
    }

    /// Every invoice, walking the pages with the configured page size.
    pub async fn list_all_invoices(
        &self,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<InvoiceDto>, ApiError> {
        let mut all = Vec::new();
        let mut page: u32 = 0;
        loop {
            let current = self.list_invoices_page(page, self.page_size, status).await?;
            // Stop on the local counter, not the page index the server echoes.
            let last = current.content.is_empty() || page.saturating_add(1) >= current.total_pages;
            all.extend(current.content);
            if last {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceDto, ApiError> {
        self.get(&format!("/api/invoices/{id}")).await
    }

    pub async fn create_invoice(&self, input: &InvoiceInput) -> Result<InvoiceDto, ApiError> {
        validate_lines(&input.items)?;
        self.send_json(Method::POST, "/api/invoices", input).await
    }

    /// Replace the line items; rejected locally if any line is invalid.
    pub async fn update_invoice_items(
        &self,
        id: InvoiceId,
        items: &[LineDraft],
    ) -> Result<InvoiceDto, ApiError> {
        validate_lines(items)?;
        let body = ItemsUpdate {
            items: items.to_vec(),
        };
        self.send_json(Method::PUT, &format!("/api/invoices/{id}/items"), &body).await
    }

    pub async fn change_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<InvoiceDto, ApiError> {
        self.send_json(Method::PATCH, &format!("/api/invoices/{id}/status"), &StatusChange { status })
            .await
    }

    /// Rendered PDF bytes as served by the backend.
    pub async fn download_invoice_pdf(&self, id: InvoiceId) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .execute(self.request(Method::GET, &format!("/api/invoices/{id}/pdf")))
            .await?;
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recurring plans
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn list_plans(&self) -> Result<Vec<PlanDto>, ApiError> {
        self.get("/api/recurring-plans").await
    }

    pub async fn create_plan(&self, input: &PlanInput) -> Result<PlanDto, ApiError> {
        validate_lines(&input.items)?;
        self.send_json(Method::POST, "/api/recurring-plans", input).await
    }

    pub async fn pause_plan(&self, id: RecurringPlanId) -> Result<PlanDto, ApiError> {
        self.json(self.request(Method::POST, &format!("/api/recurring-plans/{id}/pause")))
            .await
    }

    pub async fn resume_plan(&self, id: RecurringPlanId) -> Result<PlanDto, ApiError> {
        self.json(self.request(Method::POST, &format!("/api/recurring-plans/{id}/resume")))
            .await
    }

    pub async fn delete_plan(&self, id: RecurringPlanId) -> Result<(), ApiError> {
        self.delete(&format!("/api/recurring-plans/{id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users & roles
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn list_users(&self) -> Result<Vec<UserDto>, ApiError> {
        self.get("/api/users").await
    }

    pub async fn create_user(&self, input: &UserInput) -> Result<UserDto, ApiError> {
        if !input.email.contains('@') {
            return Err(DomainError::field("email", "invalid email format").into());
        }
        self.send_json(Method::POST, "/api/users", input).await
    }

    pub async fn assign_roles(
        &self,
        id: UserId,
        roles: &[Role],
    ) -> Result<UserDto, ApiError> {
        let body = RoleAssignment {
            roles: roles.to_vec(),
        };
        self.send_json(Method::PUT, &format!("/api/users/{id}/roles"), &body).await
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleDto>, ApiError> {
        self.get("/api/roles").await
    }
}
