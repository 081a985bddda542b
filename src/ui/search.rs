// Copyright 2023 Remi Bernotavicius

use crate::database::{self, models::IngredientId};
use eframe::egui;
use std::hash::Hash;

const MAX_SUGGESTIONS: i64 = 20;

/// Text field with a popup of matching suggestions. Picking one stores its
/// value; the value is cleared again when the text stops matching.
pub struct SearchWidget<'a, SearchFn, ValueT> {
    buf: &'a mut String,
    value: &'a mut Option<ValueT>,
    search_fn: SearchFn,
    pop_up_id: egui::Id,
    hint_text: Option<egui::WidgetText>,
    desired_width: Option<f32>,
}

impl<'a, SearchFn, ValueT> SearchWidget<'a, SearchFn, ValueT>
where
    SearchFn: FnOnce(&str) -> Vec<(ValueT, String)>,
{
    pub fn new(
        id_salt: impl Hash,
        buf: &'a mut String,
        value: &'a mut Option<ValueT>,
        search_fn: SearchFn,
    ) -> Self {
        Self {
            buf,
            value,
            search_fn,
            pop_up_id: egui::Id::new(id_salt),
            hint_text: None,
            desired_width: None,
        }
    }

    pub fn hint_text(mut self, hint_text: impl Into<egui::WidgetText>) -> Self {
        self.hint_text = Some(hint_text.into());
        self
    }

    pub fn desired_width(mut self, desired_width: f32) -> Self {
        self.desired_width = Some(desired_width);
        self
    }
}

impl<SearchFn, ValueT> egui::Widget for SearchWidget<'_, SearchFn, ValueT>
where
    SearchFn: FnOnce(&str) -> Vec<(ValueT, String)>,
    ValueT: Clone,
{
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let Self {
            pop_up_id,
            buf,
            value,
            search_fn,
            hint_text,
            desired_width,
        } = self;

        let mut edit = egui::TextEdit::singleline(buf);
        if let Some(hint_text) = hint_text {
            edit = edit.hint_text(hint_text);
        }
        if let Some(desired_width) = desired_width {
            edit = edit.desired_width(desired_width);
        }
        let mut r = edit.show(ui).response;
        if r.gained_focus() {
            ui.memory_mut(|m| m.open_popup(pop_up_id));
        }

        let mut changed = false;
        egui::popup_below_widget(
            ui,
            pop_up_id,
            &r,
            egui::PopupCloseBehavior::CloseOnClick,
            |ui| {
                egui::ScrollArea::vertical()
                    .max_height(240.0)
                    .show(ui, |ui| {
                        let mut matches_valid = false;
                        for (text_id, text) in search_fn(buf) {
                            if buf == &text {
                                matches_valid = true;
                                if value.is_none() {
                                    *value = Some(text_id.clone());
                                }
                            }

                            if ui.selectable_label(false, &text).clicked() {
                                *value = Some(text_id);
                                *buf = text;
                                changed = true;
                                ui.memory_mut(|m| m.close_popup());
                                matches_valid = true;
                            }
                        }
                        if !matches_valid {
                            *value = None;
                        }
                    });
            },
        );

        if changed {
            r.mark_changed();
        }

        r
    }
}

/// The last suggestion list, reused while the query text is unchanged.
#[derive(Default)]
pub struct CachedQuery<IdT> {
    query: String,
    results: Vec<(IdT, String)>,
}

pub fn search_ingredients(
    conn: &mut database::Connection,
    cached: &mut Option<CachedQuery<IngredientId>>,
    query: &str,
) -> Vec<(IngredientId, String)> {
    if let Some(cached) = cached.as_ref() {
        if cached.query == query {
            return cached.results.clone();
        }
    }

    let results: Vec<_> = match database::query::search_ingredients(conn, query, MAX_SUGGESTIONS)
    {
        Ok(found) => found.into_iter().map(|i| (i.id, i.to_string())).collect(),
        Err(error) => {
            log::warn!("ingredient search for {query:?} failed: {error}");
            vec![]
        }
    };

    *cached = Some(CachedQuery {
        query: query.into(),
        results: results.clone(),
    });
    results
}

#[test]
fn ingredient_suggestions_are_cached() {
    let mut conn = database::establish_test_connection();
    database::query::fixtures::kitchen(&mut conn);

    let mut cache = None;
    let found = search_ingredients(&mut conn, &mut cache, "bee");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1, "beet, g");

    // A cached answer survives the row going away until the query changes.
    database::query::delete_ingredient(&mut conn, found[0].0).unwrap();
    assert_eq!(search_ingredients(&mut conn, &mut cache, "bee"), found);
    assert!(search_ingredients(&mut conn, &mut cache, "beet").is_empty());
}
