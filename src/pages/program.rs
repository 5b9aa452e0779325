use leptos::*;
use std::collections::HashSet;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

use crate::autosave::{FormLifecycle, SAVE_DEBOUNCE_MS};
use crate::exercises::{self, SET_SLOT_COUNT};
use crate::log;
use crate::sheets::{FetchTransport, SheetsClient};
use crate::storage::{Store, THEME_DARK, THEME_LIGHT};
use crate::types::{AppView, ExerciseEntry};

fn new_client(store: Store, set_view: WriteSignal<AppView>) -> SheetsClient<FetchTransport> {
    SheetsClient::new(FetchTransport, store, Rc::new(move || set_view.set(AppView::Auth)))
}

#[component]
pub fn ProgramPage(store: Store, set_view: WriteSignal<AppView>, week: u32) -> impl IntoView {
    let spreadsheet_id = store.spreadsheet_id().unwrap_or_default();
    let sheet_url = format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}");
    let (group, set_group) = create_signal(Option::<String>::None);

    let logout_store = store.clone();

    view! {
        <div class="program">
            <header class="program-header">
                <ThemeSwitch store=store.clone() />
                <a class="program-title" href=sheet_url target="_blank" rel="noopener noreferrer">
                    "Programme"
                </a>
                <div class="program-actions">
                    <button
                        class="secondary-button"
                        on:click=move |_| set_view.set(AppView::Configure)
                    >
                        "Configuration"
                    </button>
                    <button
                        class="danger-button"
                        on:click=move |_| {
                            logout_store.clear_access_token();
                            set_view.set(AppView::Auth);
                        }
                    >
                        "Déconnexion"
                    </button>
                </div>
            </header>

            <WeekSelector store=store.clone() set_view=set_view current_week=week />
            <GroupSelector store=store.clone() set_view=set_view week=week group=group set_group=set_group />
            <ExerciseForm store=store set_view=set_view week=week group=group />
        </div>
    }
}

#[component]
fn ThemeSwitch(store: Store) -> impl IntoView {
    let (theme, set_theme) = create_signal(store.theme());

    create_effect(move |_| {
        let theme = theme.get();
        if let Some(root) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
        {
            let _ = root.set_attribute("data-bs-theme", &theme);
        }
        store.set_theme(&theme);
    });

    view! {
        <button
            class="theme-switch"
            on:click=move |_| {
                set_theme.update(|t| {
                    *t = if t.as_str() == THEME_DARK {
                        THEME_LIGHT.to_string()
                    } else {
                        THEME_DARK.to_string()
                    }
                });
            }
        >
            {move || if theme.get() == THEME_DARK { "🌙" } else { "☀️" }}
        </button>
    }
}

/// One button per sheet tab whose title looks like a week.
#[component]
fn WeekSelector(
    store: Store,
    set_view: WriteSignal<AppView>,
    current_week: u32,
) -> impl IntoView {
    let (weeks, set_weeks) = create_signal(Vec::<u32>::new());
    let (loading, set_loading) = create_signal(true);

    create_effect(move |_| {
        let store = store.clone();
        spawn_local(async move {
            let Some(spreadsheet_id) = store.spreadsheet_id() else {
                set_loading.set(false);
                return;
            };
            let client = new_client(store.clone(), set_view);
            match client.spreadsheet_info(&spreadsheet_id).await {
                Ok(tabs) => {
                    let mut numbers: Vec<u32> = tabs
                        .iter()
                        .filter_map(|tab| exercises::week_number_from_title(&tab.title))
                        .collect();
                    numbers.sort_unstable();
                    numbers.dedup();
                    set_weeks.set(numbers);
                }
                Err(e) => {
                    log::error(&format!("Erreur chargement sheets: {}", e.message()));
                }
            }
            set_loading.set(false);
        });
    });

    view! {
        <div class="week-selector">
            {move || if loading.get() {
                view! { <span class="loading-text">"Chargement..."</span> }.into_view()
            } else {
                let numbers = weeks.get();
                if numbers.is_empty() {
                    view! {
                        <span class="muted-text">"Aucune semaine trouvée dans le spreadsheet"</span>
                    }.into_view()
                } else {
                    numbers.into_iter().map(|number| {
                        let class = if number == current_week {
                            "week-button current"
                        } else {
                            "week-button"
                        };
                        view! {
                            <button
                                class=class
                                on:click=move |_| set_view.set(AppView::Program { week: number })
                            >
                                {format!("Semaine {number}")}
                            </button>
                        }
                    }).collect_view()
                }
            }}
        </div>
    }
}

/// One button per named range of the week; the first group is selected
/// automatically.
#[component]
fn GroupSelector(
    store: Store,
    set_view: WriteSignal<AppView>,
    week: u32,
    group: ReadSignal<Option<String>>,
    set_group: WriteSignal<Option<String>>,
) -> impl IntoView {
    let (groups, set_groups) = create_signal(Vec::<String>::new());

    create_effect(move |_| {
        let store = store.clone();
        spawn_local(async move {
            let Some(spreadsheet_id) = store.spreadsheet_id() else { return };
            let client = new_client(store.clone(), set_view);
            match client.named_ranges(&spreadsheet_id).await {
                Ok(names) => {
                    let prefix = format!("semaine{week}_");
                    let mut found: Vec<String> = names
                        .into_iter()
                        .filter_map(|name| name.strip_prefix(&prefix).map(str::to_string))
                        .collect();
                    found.sort();

                    if group.get_untracked().is_none() {
                        if let Some(first) = found.first() {
                            set_group.set(Some(first.clone()));
                        }
                    }
                    set_groups.set(found);
                }
                Err(e) => {
                    log::error(&format!(
                        "Erreur lors du chargement des plages nommées: {}",
                        e.message()
                    ));
                }
            }
        });
    });

    view! {
        <div class="group-selector">
            {move || {
                groups.get().into_iter().map(|name| {
                    let selected = group.get() == Some(name.clone());
                    let class = if selected { "group-button current" } else { "group-button" };
                    let chosen = name.clone();
                    view! {
                        <button class=class on:click=move |_| set_group.set(Some(chosen.clone()))>
                            {name.clone()}
                        </button>
                    }
                }).collect_view()
            }}
        </div>
    }
}

#[component]
fn FormSkeleton() -> impl IntoView {
    view! {
        <div class="exercise-list">
            {(0..3).map(|_| view! {
                <div class="exercise-card skeleton">
                    <div class="card-header"><span class="skeleton-bar wide"></span></div>
                    <div class="card-body">
                        <span class="skeleton-bar"></span>
                        <span class="skeleton-bar"></span>
                        <span class="skeleton-bar narrow"></span>
                    </div>
                </div>
            }).collect_view()}
        </div>
    }
}

/// Editable exercise cards for the selected week/group, autosaved after a
/// pause in editing.
#[component]
fn ExerciseForm(
    store: Store,
    set_view: WriteSignal<AppView>,
    week: u32,
    group: ReadSignal<Option<String>>,
) -> impl IntoView {
    let (entries, set_entries) = create_signal(Vec::<ExerciseEntry>::new());
    let (is_loaded, set_is_loaded) = create_signal(false);
    let (collapsed, set_collapsed) = create_signal(HashSet::<usize>::new());

    let lifecycle = store_value(FormLifecycle::new());
    // Single timer handle: replacing it drops, and thereby cancels, the
    // previous countdown.
    let save_timer = store_value(None::<Timeout>);
    let store = store_value(store);

    let do_save = move || {
        let Some(group_name) = group.get_untracked() else { return };
        let list = entries.get_untracked();
        let store = store.get_value();
        let Some(spreadsheet_id) = store.spreadsheet_id() else { return };
        spawn_local(async move {
            let client = new_client(store, set_view);
            if let Err(e) =
                exercises::save_exercises(&client, &spreadsheet_id, week, &group_name, &list).await
            {
                log::error(&format!("Erreur lors de la sauvegarde: {}", e.message()));
            }
        });
    };

    let schedule_save = move || {
        save_timer.set_value(Some(Timeout::new(SAVE_DEBOUNCE_MS, move || {
            if lifecycle.try_update_value(|l| l.save_due()).unwrap_or(false) {
                do_save();
            }
        })));
    };

    let on_edit = move || {
        if lifecycle.with_value(|l| l.edit_arms_timer()) {
            schedule_save();
        }
    };

    // Fresh load whenever the group selection settles or changes.
    create_effect(move |_| {
        let Some(group_name) = group.get() else { return };
        let generation = lifecycle.try_update_value(|l| l.begin_load()).unwrap_or(0);
        set_is_loaded.set(false);
        set_collapsed.set(HashSet::new());

        let store = store.get_value();
        let Some(spreadsheet_id) = store.spreadsheet_id() else { return };
        spawn_local(async move {
            let client = new_client(store, set_view);
            match exercises::load_exercises(&client, &spreadsheet_id, week, &group_name).await {
                Ok(list) => {
                    // A newer navigation wins over this response.
                    if !lifecycle.try_update_value(|l| l.finish_load(generation)).unwrap_or(false) {
                        return;
                    }
                    set_entries.set(list);
                    set_is_loaded.set(true);
                    // The reset restarts the countdown like an edit would;
                    // the lifecycle swallows that first firing.
                    schedule_save();
                }
                Err(e) => {
                    log::error(&format!("Erreur: {}", e.message()));
                    if lifecycle.try_update_value(|l| l.fail_load(generation)).unwrap_or(false) {
                        set_is_loaded.set(true);
                    }
                }
            }
        });
    });

    let set_count = move |exercise_index: usize, set_index: usize, raw: String| {
        let mut list = entries.get();
        if let Some(slot) =
            list.get_mut(exercise_index).and_then(|e| e.sets.get_mut(set_index))
        {
            slot.count = raw.parse().ok();
        }
        set_entries.set(list);
        on_edit();
    };

    let set_weight = move |exercise_index: usize, set_index: usize, raw: String| {
        let mut list = entries.get();
        if let Some(slot) =
            list.get_mut(exercise_index).and_then(|e| e.sets.get_mut(set_index))
        {
            slot.weight = raw.parse().ok();
        }
        set_entries.set(list);
        on_edit();
    };

    let add_set = move |exercise_index: usize| {
        let mut list = entries.get();
        if let Some(entry) = list.get_mut(exercise_index) {
            if entry.sets.len() < SET_SLOT_COUNT {
                entry.sets.push(crate::types::SetEntry::empty());
            }
        }
        set_entries.set(list);
        on_edit();
    };

    let remove_set = move |exercise_index: usize, set_index: usize| {
        let mut list = entries.get();
        if let Some(entry) = list.get_mut(exercise_index) {
            if set_index < entry.sets.len() {
                entry.sets.remove(set_index);
            }
        }
        set_entries.set(list);
        on_edit();
    };

    let toggle_multiset = move |exercise_index: usize| {
        let mut list = entries.get();
        if let Some(entry) = list.get_mut(exercise_index) {
            entry.multiset =
                if entry.multiset.is_empty() { "Multiset".to_string() } else { String::new() };
        }
        set_entries.set(list);
        on_edit();
    };

    let add_exercise = move || {
        let mut list = entries.get();
        list.push(ExerciseEntry::blank());
        set_entries.set(list);
        on_edit();
    };

    let remove_exercise = move |exercise_index: usize| {
        let mut list = entries.get();
        if exercise_index < list.len() {
            list.remove(exercise_index);
        }
        set_entries.set(list);
        set_collapsed.set(HashSet::new());
        on_edit();
    };

    let toggle_card = move |exercise_index: usize| {
        set_collapsed.update(|set| {
            if !set.remove(&exercise_index) {
                set.insert(exercise_index);
            }
        });
    };

    view! {
        <div class="exercise-form">
            {move || if !is_loaded.get() {
                if group.get().is_none() {
                    view! { <p class="muted-text">"Aucun groupe trouvé pour cette semaine"</p> }
                        .into_view()
                } else {
                    view! { <FormSkeleton /> }.into_view()
                }
            } else {
                let list = entries.get();
                if list.is_empty() {
                    view! {
                        <div class="empty-week">
                            <p class="muted-text">
                                "Cette semaine ne contient pas encore d'exercices"
                            </p>
                            <button class="primary-button" on:click=move |_| add_exercise()>
                                "Ajouter un exercice"
                            </button>
                        </div>
                    }.into_view()
                } else {
                    view! {
                        <div class="exercise-list">
                            {list.into_iter().enumerate().map(|(exercise_index, entry)| {
                                let is_open = move || !collapsed.get().contains(&exercise_index);
                                let multiset_checked = !entry.multiset.is_empty();
                                let multiset_label = if entry.multiset.is_empty() {
                                    "Multiset".to_string()
                                } else {
                                    entry.multiset.clone()
                                };
                                let repetitions = entry.repetitions.clone();
                                let youtube_link = entry.youtube_link.clone();
                                let placeholders = entry.set_placeholders.clone();
                                let sets = entry.sets.clone();

                                view! {
                                    <div class="exercise-card">
                                        <div class="card-header">
                                            <button
                                                class="collapse-toggle"
                                                on:click=move |_| toggle_card(exercise_index)
                                            >
                                                {move || if is_open() { "▼" } else { "▶" }}
                                            </button>
                                            <input
                                                class="exercise-name"
                                                placeholder="Nom de l'exercice"
                                                prop:value=entry.exercise.clone()
                                                readonly=true
                                            />
                                            <button
                                                class="danger-button small"
                                                on:click=move |_| remove_exercise(exercise_index)
                                            >
                                                "X"
                                            </button>
                                        </div>

                                        {move || is_open().then(|| {
                                            let multiset_label = multiset_label.clone();
                                            let repetitions = repetitions.clone();
                                            let youtube_link = youtube_link.clone();
                                            let placeholders = placeholders.clone();
                                            let sets = sets.clone();
                                            let set_total = sets.len();

                                            view! {
                                                <div class="card-body">
                                                    <div class="exercise-meta">
                                                        <label class="multiset-check">
                                                            <input
                                                                type="checkbox"
                                                                checked=multiset_checked
                                                                on:change=move |_| toggle_multiset(exercise_index)
                                                            />
                                                            <span>{multiset_label}</span>
                                                        </label>
                                                        <input
                                                            class="repetitions"
                                                            placeholder="Répétitions attendues (ex: 10-12)"
                                                            prop:value=repetitions
                                                            readonly=true
                                                        />
                                                        {(!youtube_link.is_empty()).then(|| view! {
                                                            <a
                                                                class="video-link"
                                                                href=youtube_link.clone()
                                                                target="_blank"
                                                                rel="noopener noreferrer"
                                                            >
                                                                "Vidéo"
                                                            </a>
                                                        })}
                                                    </div>

                                                    <div class="set-row set-row-labels">
                                                        <span class="set-number"></span>
                                                        <span>"Répétitions"</span>
                                                        <span>"Poids (kg)"</span>
                                                        <span class="set-remove"></span>
                                                    </div>

                                                    {sets.into_iter().enumerate().map(|(set_index, set)| {
                                                        let count_hint = placeholders
                                                            .get(set_index)
                                                            .and_then(|p| p.count)
                                                            .map(|c| c.to_string())
                                                            .unwrap_or_default();
                                                        let weight_hint = placeholders
                                                            .get(set_index)
                                                            .and_then(|p| p.weight)
                                                            .map(|w| w.to_string())
                                                            .unwrap_or_default();
                                                        let count_value = set
                                                            .count
                                                            .map(|c| c.to_string())
                                                            .unwrap_or_default();
                                                        let weight_value = set
                                                            .weight
                                                            .map(|w| w.to_string())
                                                            .unwrap_or_default();

                                                        view! {
                                                            <div class="set-row">
                                                                <span class="set-number">{set_index + 1}</span>
                                                                <input
                                                                    type="number"
                                                                    class="set-input"
                                                                    placeholder=count_hint
                                                                    prop:value=count_value
                                                                    on:input=move |ev| {
                                                                        set_count(exercise_index, set_index, event_target_value(&ev));
                                                                    }
                                                                />
                                                                <input
                                                                    type="number"
                                                                    step="0.5"
                                                                    class="set-input"
                                                                    placeholder=weight_hint
                                                                    prop:value=weight_value
                                                                    on:input=move |ev| {
                                                                        set_weight(exercise_index, set_index, event_target_value(&ev));
                                                                    }
                                                                />
                                                                <button
                                                                    class="danger-button small set-remove"
                                                                    on:click=move |_| remove_set(exercise_index, set_index)
                                                                >
                                                                    "X"
                                                                </button>
                                                            </div>
                                                        }
                                                    }).collect_view()}

                                                    <button
                                                        class="secondary-button add-set"
                                                        disabled={set_total >= SET_SLOT_COUNT}
                                                        title={if set_total >= SET_SLOT_COUNT { "Maximum 4 sets" } else { "" }}
                                                        on:click=move |_| add_set(exercise_index)
                                                    >
                                                        "+ Ajouter un set"
                                                    </button>
                                                </div>
                                            }
                                        })}
                                    </div>
                                }
                            }).collect_view()}

                            <button class="primary-button add-exercise" on:click=move |_| add_exercise()>
                                "Ajouter un exercice"
                            </button>
                        </div>
                    }.into_view()
                }
            }}
        </div>
    }
}
