use serde::Serialize;

use crate::models::{Layout, Preferences, RecommendationItem, RecommendationResponse};

/// Items per feed row
pub const ROW_WINDOW: usize = 12;

/// Case-insensitive substring match of the trimmed query against the title
///
/// A blank query matches everything; an untitled item never matches a
/// non-blank query.
pub fn matches_query(item: &RecommendationItem, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    !item.title.is_empty() && item.title.to_lowercase().contains(&needle)
}

pub fn filter_by_query(items: &[RecommendationItem], query: &str) -> Vec<RecommendationItem> {
    items
        .iter()
        .filter(|item| matches_query(item, query))
        .cloned()
        .collect()
}

pub fn exclude_hidden(items: &[RecommendationItem], prefs: &Preferences) -> Vec<RecommendationItem> {
    items
        .iter()
        .filter(|item| !prefs.is_hidden(&item.item_id))
        .cloned()
        .collect()
}

/// Saved items of the batch in batch order. Hidden wins over saved.
pub fn saved_items(items: &[RecommendationItem], prefs: &Preferences) -> Vec<RecommendationItem> {
    items
        .iter()
        .filter(|item| prefs.saved.contains(&item.item_id) && !prefs.is_hidden(&item.item_id))
        .cloned()
        .collect()
}

/// The two feed rows: first window and the window after it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedRows {
    pub for_you: Vec<RecommendationItem>,
    pub trending: Vec<RecommendationItem>,
}

impl FeedRows {
    /// What the second row displays: itself, or the first row when it is empty
    pub fn trending_or_fallback(&self) -> &[RecommendationItem] {
        if self.trending.is_empty() {
            &self.for_you
        } else {
            &self.trending
        }
    }
}

/// Splits by count into `[0, window)` and `[window, 2 * window)`
pub fn split_rows(items: &[RecommendationItem], window: usize) -> FeedRows {
    let first_end = window.min(items.len());
    let second_end = (window * 2).min(items.len());
    FeedRows {
        for_you: items[..first_end].to_vec(),
        trending: items[first_end..second_end].to_vec(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardColumn {
    Pending,
    InReview,
    Approved,
}

/// Decides which board column an item goes in, if any
pub type ColumnPolicy = fn(&RecommendationItem) -> Option<BoardColumn>;

/// Placeholder split by fixed position ranges: 1-12, 13-24, 25-36.
///
/// There is no review workflow behind these names; items carry no status yet.
/// Swap the policy once they do.
pub fn placeholder_column(item: &RecommendationItem) -> Option<BoardColumn> {
    match item.position {
        1..=12 => Some(BoardColumn::Pending),
        13..=24 => Some(BoardColumn::InReview),
        25..=36 => Some(BoardColumn::Approved),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardColumns {
    pub pending: Vec<RecommendationItem>,
    pub in_review: Vec<RecommendationItem>,
    pub approved: Vec<RecommendationItem>,
}

pub fn split_columns(items: &[RecommendationItem], policy: ColumnPolicy) -> BoardColumns {
    let mut columns = BoardColumns::default();
    for item in items {
        let column = match policy(item) {
            Some(BoardColumn::Pending) => &mut columns.pending,
            Some(BoardColumn::InReview) => &mut columns.in_review,
            Some(BoardColumn::Approved) => &mut columns.approved,
            None => continue,
        };
        column.push(item.clone());
    }
    columns
}

/// Main area of the view, shaped by the layout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum Sections {
    Feed {
        for_you: Vec<RecommendationItem>,
        trending: Vec<RecommendationItem>,
        /// The trending window was empty and repeats `for_you`
        trending_is_fallback: bool,
    },
    Board(BoardColumns),
}

impl Sections {
    fn items_mut(&mut self) -> Vec<&mut Vec<RecommendationItem>> {
        match self {
            Sections::Feed {
                for_you, trending, ..
            } => vec![for_you, trending],
            Sections::Board(columns) => vec![
                &mut columns.pending,
                &mut columns.in_review,
                &mut columns.approved,
            ],
        }
    }
}

/// Everything the dashboard renders, derived from its inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFeed {
    pub hero: Option<RecommendationItem>,
    pub sections: Sections,
    pub saved: Vec<RecommendationItem>,
    pub because_you_clicked: Vec<RecommendationItem>,
    /// Drives the "unhide all" control
    pub hidden_count: usize,
    /// Items left after search and hidden exclusion
    pub visible_count: usize,
}

impl DerivedFeed {
    /// Removes score diagnostics from every list, for non-debug display
    pub fn strip_diagnostics(&mut self) {
        let strip = |items: &mut Vec<RecommendationItem>| {
            for item in items.iter_mut() {
                *item = item.without_diagnostics();
            }
        };

        if let Some(hero) = self.hero.as_mut() {
            *hero = hero.without_diagnostics();
        }
        for list in self.sections.items_mut() {
            strip(list);
        }
        strip(&mut self.saved);
        strip(&mut self.because_you_clicked);
    }
}

/// Inputs of one derivation pass
pub struct FeedInputs<'a> {
    pub primary: Option<&'a RecommendationResponse>,
    pub because_you_clicked: Option<&'a RecommendationResponse>,
    pub query: &'a str,
    pub prefs: &'a Preferences,
    pub layout: Layout,
}

/// Pure derivation; same inputs always give the same view
///
/// The query narrows only the primary sections and hero. Saved and
/// because-you-clicked lists ignore it. Hidden items are dropped everywhere.
pub fn derive(inputs: &FeedInputs<'_>) -> DerivedFeed {
    let primary_items = inputs.primary.map(|r| r.items.as_slice()).unwrap_or(&[]);
    let filtered = filter_by_query(primary_items, inputs.query);
    let visible = exclude_hidden(&filtered, inputs.prefs);

    let sections = match inputs.layout {
        Layout::Feed => {
            let rows = split_rows(&visible, ROW_WINDOW);
            let trending_is_fallback = rows.trending.is_empty();
            Sections::Feed {
                trending: rows.trending_or_fallback().to_vec(),
                for_you: rows.for_you,
                trending_is_fallback,
            }
        }
        Layout::Board => Sections::Board(split_columns(&visible, placeholder_column)),
    };

    let because_you_clicked = inputs
        .because_you_clicked
        .map(|r| exclude_hidden(&r.items, inputs.prefs))
        .unwrap_or_default();

    DerivedFeed {
        hero: visible.first().cloned(),
        sections,
        saved: saved_items(primary_items, inputs.prefs),
        because_you_clicked,
        hidden_count: inputs.prefs.hidden.len(),
        visible_count: visible.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PreferenceKind;
    use std::collections::HashSet;

    fn item(id: &str, title: &str, position: u32) -> RecommendationItem {
        RecommendationItem::new(id, title, position)
    }

    fn batch(count: u32) -> Vec<RecommendationItem> {
        (1..=count)
            .map(|p| item(&format!("N{}", p), &format!("Story number {}", p), p))
            .collect()
    }

    fn ids(items: &[RecommendationItem]) -> Vec<&str> {
        items.iter().map(|i| i.item_id.as_str()).collect()
    }

    #[test]
    fn test_blank_query_passes_everything() {
        let items = vec![item("a", "Alpha", 1), item("b", "", 2)];
        assert_eq!(filter_by_query(&items, ""), items);
        assert_eq!(filter_by_query(&items, "   \t"), items);
    }

    #[test]
    fn test_query_is_trimmed_and_case_insensitive() {
        let items = vec![
            item("a", "Climate Summit opens", 1),
            item("b", "Sports roundup", 2),
            item("c", "SUMMIT talks stall", 3),
        ];
        assert_eq!(ids(&filter_by_query(&items, "  summit ")), vec!["a", "c"]);
    }

    #[test]
    fn test_untitled_never_matches_query() {
        let items = vec![item("a", "", 1)];
        assert!(filter_by_query(&items, "a").is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let items = vec![
            item("a", "Rates hold steady", 1),
            item("b", "Rate cut expected", 2),
            item("c", "Weather", 3),
            item("d", "", 4),
        ];
        for query in ["", "rate", "RATES", " weather ", "zzz"] {
            let once = filter_by_query(&items, query);
            let twice = filter_by_query(&once, query);
            assert_eq!(once, twice, "query {:?}", query);
        }
    }

    #[test]
    fn test_rows_are_disjoint_cover_of_window() {
        for count in [1, 5, 12, 13, 24, 30] {
            let items = batch(count);
            let rows = split_rows(&items, ROW_WINDOW);

            let first: HashSet<_> = rows.for_you.iter().map(|i| &i.item_id).collect();
            let second: HashSet<_> = rows.trending.iter().map(|i| &i.item_id).collect();
            assert!(first.is_disjoint(&second), "count {}", count);

            let covered = rows.for_you.len() + rows.trending.len();
            assert_eq!(covered, (count as usize).min(2 * ROW_WINDOW));
            let expected: Vec<_> = items.iter().take(covered).cloned().collect();
            let mut joined = rows.for_you.clone();
            joined.extend(rows.trending.clone());
            assert_eq!(joined, expected);
        }
    }

    #[test]
    fn test_empty_trending_falls_back_to_first_row() {
        let items = batch(5);
        let rows = split_rows(&items, ROW_WINDOW);
        assert!(rows.trending.is_empty());
        assert_eq!(rows.trending_or_fallback(), rows.for_you.as_slice());

        let rows = split_rows(&batch(20), ROW_WINDOW);
        assert_eq!(ids(rows.trending_or_fallback()).first(), Some(&"N13"));
    }

    #[test]
    fn test_board_columns_by_position_range() {
        let items = batch(40);
        let columns = split_columns(&items, placeholder_column);

        assert_eq!(columns.pending.len(), 12);
        assert_eq!(columns.in_review.len(), 12);
        assert_eq!(columns.approved.len(), 12);
        assert_eq!(columns.pending[0].position, 1);
        assert_eq!(columns.in_review[0].position, 13);
        assert_eq!(columns.approved[11].position, 36);

        let mut seen = HashSet::new();
        for list in [&columns.pending, &columns.in_review, &columns.approved] {
            for it in list.iter() {
                assert!(seen.insert(it.item_id.clone()), "{} appears twice", it.item_id);
                assert!(items.contains(it));
            }
        }
    }

    #[test]
    fn test_board_columns_follow_position_not_index() {
        // After filtering, positions are sparse; columns still go by position.
        let items = vec![item("a", "x", 3), item("b", "x", 14), item("c", "x", 30)];
        let columns = split_columns(&items, placeholder_column);
        assert_eq!(ids(&columns.pending), vec!["a"]);
        assert_eq!(ids(&columns.in_review), vec!["b"]);
        assert_eq!(ids(&columns.approved), vec!["c"]);
    }

    #[test]
    fn test_board_policy_is_swappable() {
        fn everything_approved(_: &RecommendationItem) -> Option<BoardColumn> {
            Some(BoardColumn::Approved)
        }
        let columns = split_columns(&batch(3), everything_approved);
        assert!(columns.pending.is_empty());
        assert_eq!(columns.approved.len(), 3);
    }

    #[test]
    fn test_saved_subset_preserves_fields() {
        let mut items = batch(6);
        items[4].item_id = "x".to_string();
        items[4].rank_score = Some(0.731);
        items[4].final_score = Some(0.9);

        let mut prefs: Preferences = serde_json::from_str(r#"{"saved":{"x":true}}"#).unwrap();
        let saved = saved_items(&items, &prefs);
        assert_eq!(saved, vec![items[4].clone()]);
        assert_eq!(saved[0].position, 5);

        prefs.toggle(PreferenceKind::Saved, "N2");
        assert_eq!(ids(&saved_items(&items, &prefs)), vec!["N2", "x"]);
    }

    #[test]
    fn test_hidden_items_absent_everywhere_until_unhidden() {
        let response = RecommendationResponse {
            impression_id: Some("imp-1".to_string()),
            items: batch(29),
        };
        let secondary = RecommendationResponse {
            impression_id: Some("imp-2".to_string()),
            items: vec![item("N3", "Story number 3", 1), item("Z1", "Other", 2)],
        };

        let mut prefs = Preferences::new();
        prefs.toggle(PreferenceKind::Saved, "N3");
        prefs.hide("N3");
        prefs.hide("N1");

        for layout in [Layout::Feed, Layout::Board] {
            let derived = derive(&FeedInputs {
                primary: Some(&response),
                because_you_clicked: Some(&secondary),
                query: "",
                prefs: &prefs,
                layout,
            });

            let mut lists = vec![derived.saved.clone(), derived.because_you_clicked.clone()];
            match &derived.sections {
                Sections::Feed {
                    for_you, trending, ..
                } => {
                    lists.push(for_you.clone());
                    lists.push(trending.clone());
                }
                Sections::Board(columns) => {
                    lists.push(columns.pending.clone());
                    lists.push(columns.in_review.clone());
                    lists.push(columns.approved.clone());
                }
            }
            for list in lists {
                assert!(!list.iter().any(|i| prefs.is_hidden(&i.item_id)));
            }
            assert_eq!(derived.hero.as_ref().map(|i| i.item_id.as_str()), Some("N2"));
            assert_eq!(derived.hidden_count, 2);
        }

        prefs.unhide_all();
        let derived = derive(&FeedInputs {
            primary: Some(&response),
            because_you_clicked: Some(&secondary),
            query: "number 3",
            prefs: &prefs,
            layout: Layout::Feed,
        });
        assert_eq!(derived.hidden_count, 0);
        assert_eq!(derived.visible_count, 1);
        assert_eq!(ids(&derived.saved), vec!["N3"]);
        assert_eq!(ids(&derived.because_you_clicked), vec!["N3", "Z1"]);
        match derived.sections {
            Sections::Feed {
                for_you,
                trending_is_fallback,
                ..
            } => {
                assert_eq!(ids(&for_you), vec!["N3"]);
                assert!(trending_is_fallback);
            }
            Sections::Board(_) => panic!("expected feed layout"),
        }
    }

    #[test]
    fn test_derive_without_batch_is_empty() {
        let prefs = Preferences::new();
        let derived = derive(&FeedInputs {
            primary: None,
            because_you_clicked: None,
            query: "anything",
            prefs: &prefs,
            layout: Layout::Feed,
        });
        assert_eq!(derived.hero, None);
        assert_eq!(derived.visible_count, 0);
        assert!(derived.saved.is_empty());
        assert!(derived.because_you_clicked.is_empty());
    }

    #[test]
    fn test_strip_diagnostics() {
        let mut items = batch(2);
        items[0].retrieval_score = Some(0.5);
        let response = RecommendationResponse {
            impression_id: Some("imp-1".to_string()),
            items,
        };
        let prefs = Preferences::new();
        let mut derived = derive(&FeedInputs {
            primary: Some(&response),
            because_you_clicked: None,
            query: "",
            prefs: &prefs,
            layout: Layout::Board,
        });

        derived.strip_diagnostics();
        assert_eq!(derived.hero.unwrap().retrieval_score, None);
        match derived.sections {
            Sections::Board(columns) => assert_eq!(columns.pending[0].retrieval_score, None),
            Sections::Feed { .. } => panic!("expected board layout"),
        }
    }

    #[test]
    fn test_sections_serialize_with_layout_tag() {
        let sections = Sections::Board(BoardColumns::default());
        let json = serde_json::to_value(&sections).unwrap();
        assert_eq!(json["layout"], "board");
        assert!(json["in_review"].as_array().unwrap().is_empty());
    }
}
