use std::rc::Rc;

use serde::Deserialize;

use crate::storage::Store;
use crate::types::{NamedRangeLocation, SheetTab};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: &'static str,
    pub url: String,
    pub bearer: String,
    pub body: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP seam. The browser implementation wraps `fetch`; tests swap in a
/// recording fake. Everything runs on the single wasm thread, so the
/// futures carry no Send bound.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiError {
    /// No token in the store. Raised before any network call.
    NotAuthenticated,
    /// 401/403 from the API. The token has been cleared and the
    /// session-expired hook invoked; callers do not retry.
    SessionExpired,
    Http(u16),
    Network(String),
    Parse(String),
}

impl ApiError {
    pub fn message(&self) -> String {
        match self {
            ApiError::NotAuthenticated => "Non authentifié".to_string(),
            ApiError::SessionExpired => {
                "Session expirée, redirection vers la connexion...".to_string()
            }
            ApiError::Http(status) => format!("Erreur HTTP {status}"),
            ApiError::Network(msg) => format!("Erreur réseau: {msg}"),
            ApiError::Parse(msg) => format!("Réponse illisible: {msg}"),
        }
    }
}

#[derive(Deserialize)]
struct GridRange {
    #[serde(default, rename = "startRowIndex")]
    start_row_index: u32,
    #[serde(default, rename = "startColumnIndex")]
    start_column_index: u32,
    #[serde(default, rename = "endRowIndex")]
    end_row_index: u32,
    #[serde(default, rename = "endColumnIndex")]
    end_column_index: u32,
}

#[derive(Deserialize)]
struct NamedRange {
    name: String,
    #[serde(default)]
    range: Option<GridRange>,
}

#[derive(Deserialize)]
struct NamedRangesResponse {
    #[serde(default, rename = "namedRanges")]
    named_ranges: Vec<NamedRange>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "sheetId")]
    sheet_id: i64,
}

#[derive(Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

/// Authenticated client for the spreadsheet REST API. Holds the config
/// store for the bearer token and a hook fired when the session expires
/// (the app wires it to navigate back to the auth view).
pub struct SheetsClient<T: Transport> {
    transport: T,
    store: Store,
    on_session_expired: Rc<dyn Fn()>,
}

impl<T: Transport> SheetsClient<T> {
    pub fn new(transport: T, store: Store, on_session_expired: Rc<dyn Fn()>) -> Self {
        Self { transport, store, on_session_expired }
    }

    async fn call(
        &self,
        method: &'static str,
        url: String,
        body: Option<String>,
    ) -> Result<serde_json::Value, ApiError> {
        let bearer = self.store.access_token().ok_or(ApiError::NotAuthenticated)?;
        let request = HttpRequest { method, url, bearer, body };
        let response = self.transport.send(&request).await.map_err(ApiError::Network)?;

        if response.status == 401 || response.status == 403 {
            self.store.clear_access_token();
            (self.on_session_expired)();
            return Err(ApiError::SessionExpired);
        }
        if response.status >= 400 {
            return Err(ApiError::Http(response.status));
        }

        serde_json::from_str(&response.body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn named_ranges_response(
        &self,
        spreadsheet_id: &str,
    ) -> Result<NamedRangesResponse, ApiError> {
        let url = format!("{SHEETS_API}/{spreadsheet_id}?fields=namedRanges");
        let data = self.call("GET", url, None).await?;
        serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Names of every named range defined in the spreadsheet.
    pub async fn named_ranges(&self, spreadsheet_id: &str) -> Result<Vec<String>, ApiError> {
        let data = self.named_ranges_response(spreadsheet_id).await?;
        Ok(data.named_ranges.into_iter().map(|nr| nr.name).collect())
    }

    /// Grid location of one named range, `None` when the sheet does not
    /// define it.
    pub async fn named_range_location(
        &self,
        spreadsheet_id: &str,
        range_name: &str,
    ) -> Result<Option<NamedRangeLocation>, ApiError> {
        let data = self.named_ranges_response(spreadsheet_id).await?;
        Ok(data
            .named_ranges
            .into_iter()
            .find(|nr| nr.name == range_name)
            .and_then(|nr| nr.range)
            .map(|range| NamedRangeLocation {
                start_row: range.start_row_index,
                start_column: range.start_column_index,
                end_row: range.end_row_index,
                end_column: range.end_column_index,
            }))
    }

    /// Cell values of a range, row-major. Empty when the range holds none.
    pub async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ApiError> {
        let url = format!("{SHEETS_API}/{spreadsheet_id}/values/{range}");
        let data = self.call("GET", url, None).await?;
        let values: ValueRange =
            serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(values.values)
    }

    /// Overwrites a range with the given rows.
    pub async fn write_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!("{SHEETS_API}/{spreadsheet_id}/values/{range}?valueInputOption=RAW");
        let body = serde_json::json!({ "values": values }).to_string();
        self.call("PUT", url, Some(body)).await
    }

    /// Appends rows after the last populated row of a range.
    pub async fn append_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<serde_json::Value, ApiError> {
        let url =
            format!("{SHEETS_API}/{spreadsheet_id}/values/{range}:append?valueInputOption=RAW");
        let body = serde_json::json!({ "values": values }).to_string();
        self.call("POST", url, Some(body)).await
    }

    /// Title and id of every tab in the spreadsheet, in sheet order.
    pub async fn spreadsheet_info(
        &self,
        spreadsheet_id: &str,
    ) -> Result<Vec<SheetTab>, ApiError> {
        let url = format!("{SHEETS_API}/{spreadsheet_id}");
        let data = self.call("GET", url, None).await?;
        let spreadsheet: SpreadsheetResponse =
            serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|sheet| SheetTab {
                title: sheet.properties.title,
                sheet_id: sheet.properties.sheet_id,
            })
            .collect())
    }
}

/// Browser transport over `fetch`.
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        use wasm_bindgen::prelude::*;
        use wasm_bindgen_futures::JsFuture;
        use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

        let window = web_sys::window().ok_or("no window")?;

        let headers = Headers::new().map_err(|_| "Failed to create headers")?;
        headers
            .set("Authorization", &format!("Bearer {}", request.bearer))
            .map_err(|_| "Failed to set authorization")?;
        if request.body.is_some() {
            headers
                .set("Content-Type", "application/json")
                .map_err(|_| "Failed to set content-type")?;
        }

        let opts = RequestInit::new();
        opts.set_method(request.method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = &request.body {
            opts.set_body(&JsValue::from_str(body));
        }
        opts.set_headers(&JsValue::from(&headers));

        let req = Request::new_with_str_and_init(&request.url, &opts)
            .map_err(|_| "Failed to create request")?;

        let resp_value = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(|_| "Fetch failed")?;
        let resp: Response = resp_value.dyn_into().map_err(|_| "Invalid response")?;
        let status = resp.status();

        let text = JsFuture::from(resp.text().map_err(|_| "No body")?)
            .await
            .map_err(|_| "Body read failed")?;

        Ok(HttpResponse { status, body: text.as_string().unwrap_or_default() })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Records every request and replays queued responses in order.
    #[derive(Default)]
    pub struct FakeTransport {
        pub requests: RefCell<Vec<HttpRequest>>,
        responses: RefCell<VecDeque<HttpResponse>>,
    }

    impl FakeTransport {
        pub fn respond_with(self, status: u16, body: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(HttpResponse { status, body: body.to_string() });
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }

        pub fn request(&self, index: usize) -> HttpRequest {
            self.requests.borrow()[index].clone()
        }
    }

    impl Transport for &FakeTransport {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| "no queued response".to_string())
        }
    }
}
