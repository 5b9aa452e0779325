use leptos::*;

use crate::auth;
use crate::log;
use crate::storage::Store;
use crate::types::{AppView, GoogleUser};

#[component]
pub fn AuthPage(store: Store, set_view: WriteSignal<AppView>) -> impl IntoView {
    let (user, set_user) = create_signal(Option::<GoogleUser>::None);
    let (checking, set_checking) = create_signal(store.access_token().is_some());

    // With a stored token, show who is connected instead of the button;
    // a token that no longer validates is discarded.
    {
        let store = store.clone();
        create_effect(move |_| {
            let Some(token) = store.access_token() else {
                set_checking.set(false);
                return;
            };
            let store = store.clone();
            spawn_local(async move {
                if auth::validate_token(&token).await {
                    match auth::fetch_user_info(&token).await {
                        Ok(profile) => set_user.set(Some(profile)),
                        Err(e) => log::error(&format!("Erreur userinfo: {e}")),
                    }
                } else {
                    store.clear_access_token();
                }
                set_checking.set(false);
            });
        });
    }

    let continue_store = store.clone();
    let logout_store = store;

    view! {
        <div class="auth-container">
            <div class="auth-logo">"CARNET"</div>
            <div class="auth-card">
                <h2 class="auth-title">"Connexion requise"</h2>
                <p class="auth-hint">
                    "Veuillez vous connecter avec Google pour accéder à l'application"
                </p>

                {move || if checking.get() {
                    view! {
                        <p class="loading-text">"Vérification de l'authentification..."</p>
                    }.into_view()
                } else if let Some(profile) = user.get() {
                    let continue_store = continue_store.clone();
                    let logout_store = logout_store.clone();
                    let label = if profile.name.is_empty() { profile.email } else { profile.name };
                    view! {
                        <p class="auth-identity">{format!("Connecté en tant que: {label}")}</p>
                        <button
                            class="auth-button"
                            on:click=move |_| {
                                set_view.set(if continue_store.spreadsheet_id().is_some() {
                                    AppView::Program { week: 1 }
                                } else {
                                    AppView::Configure
                                });
                            }
                        >
                            "Continuer"
                        </button>
                        <button
                            class="auth-link"
                            on:click=move |_| {
                                logout_store.clear_access_token();
                                set_user.set(None);
                            }
                        >
                            "Se déconnecter"
                        </button>
                    }.into_view()
                } else {
                    view! {
                        <button class="auth-button" on:click=move |_| auth::begin_login()>
                            "Se connecter avec Google"
                        </button>
                    }.into_view()
                }}
            </div>
        </div>
    }
}
