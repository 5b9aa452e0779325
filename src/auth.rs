//! Google OAuth implicit flow: the app sends the browser to the consent
//! screen and gets the access token back in the URL fragment.

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::log;
use crate::storage::Store;
use crate::types::GoogleUser;

const OAUTH_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKENINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/tokeninfo";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const CLIENT_ID: &str =
    "973406518842-c3f1useq0bv0e88m2qkcrl2tmtjbleap.apps.googleusercontent.com";

/// Consent-screen URL that redirects back to this app with the token in
/// the fragment.
pub fn login_url() -> Option<String> {
    let origin = web_sys::window()?.location().origin().ok()?;
    Some(format!(
        "{OAUTH_AUTH_URL}?client_id={CLIENT_ID}&redirect_uri={}&response_type=token&scope={}&prompt=select_account",
        String::from(js_sys::encode_uri_component(&origin)),
        String::from(js_sys::encode_uri_component(SHEETS_SCOPE)),
    ))
}

pub fn begin_login() {
    let Some(url) = login_url() else { return };
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(&url);
    }
}

/// Stores the `#access_token=` fragment Google redirects back with, then
/// scrubs the credential from the address bar. Returns true when a token
/// was captured.
pub fn capture_redirect_token(store: &Store) -> bool {
    let Some(window) = web_sys::window() else { return false };
    let location = window.location();
    let Ok(hash) = location.hash() else { return false };

    let fragment = hash.trim_start_matches('#');
    if fragment.is_empty() {
        return false;
    }
    let Ok(params) = web_sys::UrlSearchParams::new_with_str(fragment) else { return false };
    let Some(token) = params.get("access_token").filter(|t| !t.is_empty()) else { return false };

    store.set_access_token(&token);
    let _ = location.set_hash("");
    true
}

async fn fetch_text(url: &str, bearer: Option<&str>) -> Result<(u16, String), String> {
    let window = web_sys::window().ok_or("no window")?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);
    if let Some(token) = bearer {
        let headers = Headers::new().map_err(|_| "Failed to create headers")?;
        headers
            .set("Authorization", &format!("Bearer {token}"))
            .map_err(|_| "Failed to set authorization")?;
        opts.set_headers(&JsValue::from(&headers));
    }

    let request =
        Request::new_with_str_and_init(url, &opts).map_err(|_| "Failed to create request")?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|_| "Fetch failed")?;
    let resp: Response = resp_value.dyn_into().map_err(|_| "Invalid response")?;
    let status = resp.status();

    let text = JsFuture::from(resp.text().map_err(|_| "No body")?)
        .await
        .map_err(|_| "Body read failed")?;
    Ok((status, text.as_string().unwrap_or_default()))
}

/// Asks the tokeninfo endpoint whether the stored token is still valid.
/// Any failure counts as invalid; the caller clears the token and sends the
/// user back to the login page.
pub async fn validate_token(token: &str) -> bool {
    let url = format!("{TOKENINFO_URL}?access_token={token}");
    match fetch_text(&url, None).await {
        Ok((status, _)) => status < 400,
        Err(e) => {
            log::error(&format!("Erreur de vérification du token: {e}"));
            false
        }
    }
}

/// Display identity of the connected account.
pub async fn fetch_user_info(token: &str) -> Result<GoogleUser, String> {
    let (status, body) = fetch_text(USERINFO_URL, Some(token)).await?;
    if status >= 400 {
        return Err(format!("Erreur HTTP {status}"));
    }
    serde_json::from_str(&body).map_err(|e| e.to_string())
}
