use leptos::*;

use crate::storage::Store;
use crate::types::AppView;

#[component]
pub fn ConfigurePage(store: Store, set_view: WriteSignal<AppView>) -> impl IntoView {
    let (spreadsheet_id, set_spreadsheet_id) =
        create_signal(store.spreadsheet_id().unwrap_or_default());
    let (error, set_error) = create_signal(Option::<String>::None);
    let has_existing = store.spreadsheet_id().is_some();

    let save_store = store.clone();
    let do_save = move |_| {
        let id = spreadsheet_id.get().trim().to_string();
        if id.is_empty() {
            set_error.set(Some("Veuillez entrer un ID de spreadsheet".to_string()));
            return;
        }
        save_store.set_spreadsheet_id(&id);
        set_view.set(AppView::Program { week: 1 });
    };

    view! {
        <div class="configure-container">
            <h1 class="configure-title">"Configuration"</h1>
            <div class="configure-card">
                {move || error.get().map(|e| view! { <div class="form-error">{e}</div> })}

                <label class="configure-label" for="spreadsheet-id">
                    "ID du Google Spreadsheet"
                </label>
                <input
                    type="text"
                    id="spreadsheet-id"
                    class="configure-input"
                    placeholder="1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms"
                    prop:value=spreadsheet_id
                    on:input=move |ev| set_spreadsheet_id.set(event_target_value(&ev))
                />

                <div class="configure-actions">
                    <button class="primary-button" on:click=do_save>"Enregistrer"</button>
                    {has_existing.then(|| view! {
                        <button
                            class="secondary-button"
                            on:click=move |_| set_view.set(AppView::Program { week: 1 })
                        >
                            "Annuler"
                        </button>
                    })}
                </div>
            </div>
        </div>
    }
}
