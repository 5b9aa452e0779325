use leptos::*;

use crate::pages::{AuthPage, ConfigurePage, ProgramPage};
use crate::storage::Store;
use crate::types::AppView;

#[component]
pub fn App() -> impl IntoView {
    let store = Store::browser();

    let initial_view = if store.access_token().is_none() {
        AppView::Auth
    } else if store.spreadsheet_id().is_none() {
        AppView::Configure
    } else {
        AppView::Program { week: 1 }
    };
    let (view, set_view) = create_signal(initial_view);

    // External config edits (another tab logging out, a revoked id) are
    // noticed by polling the store's change counter, not by platform
    // storage events.
    {
        let store = store.clone();
        let (last_seen, set_last_seen) = create_signal(store.version());
        let interval = gloo_timers::callback::Interval::new(1_000, move || {
            let version = store.version();
            if version == last_seen.get_untracked() {
                return;
            }
            set_last_seen.set(version);
            if store.access_token().is_none() && view.get_untracked() != AppView::Auth {
                set_view.set(AppView::Auth);
            }
        });
        on_cleanup(move || drop(interval));
    }

    view! {
        <div class="app">
            {move || match view.get() {
                AppView::Auth => view! {
                    <AuthPage store=store.clone() set_view=set_view />
                }.into_view(),
                AppView::Configure => {
                    if store.access_token().is_none() {
                        view! { <AuthPage store=store.clone() set_view=set_view /> }.into_view()
                    } else {
                        view! { <ConfigurePage store=store.clone() set_view=set_view /> }.into_view()
                    }
                }
                AppView::Program { week } => view! {
                    <ProgramGate store=store.clone() set_view=set_view week=week />
                }.into_view(),
            }}
        </div>
    }
}

/// The program page only renders once the stored token still validates and
/// a spreadsheet is configured; otherwise the view falls back to the auth
/// or configuration page.
#[component]
fn ProgramGate(store: Store, set_view: WriteSignal<AppView>, week: u32) -> impl IntoView {
    let (authorized, set_authorized) = create_signal(false);

    {
        let store = store.clone();
        create_effect(move |_| {
            let Some(token) = store.access_token() else {
                set_view.set(AppView::Auth);
                return;
            };
            if store.spreadsheet_id().is_none() {
                set_view.set(AppView::Configure);
                return;
            }
            let store = store.clone();
            spawn_local(async move {
                if crate::auth::validate_token(&token).await {
                    set_authorized.set(true);
                } else {
                    store.clear_access_token();
                    set_view.set(AppView::Auth);
                }
            });
        });
    }

    view! {
        {move || if authorized.get() {
            view! { <ProgramPage store=store.clone() set_view=set_view week=week /> }.into_view()
        } else {
            view! { <div class="loading">"Vérification de l'authentification..."</div> }.into_view()
        }}
    }
}
