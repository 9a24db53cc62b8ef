use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::catalog::query::{Query, SortField, SortOrder};
use crate::catalog::repo_types::{
    CatalogEntry, Character, CharacterCategory, CharacterStatus, EntryType,
};

/// What the query pipeline needs to know about a catalog item.
///
/// Attributes an item does not carry return `None`; such items never pass an
/// active filter on that attribute and sort as "smallest" on it.
pub trait Searchable {
    fn title(&self) -> &str;
    fn phase(&self) -> &str;
    /// `needle` is already lower-cased and non-empty.
    fn matches_text(&self, needle: &str) -> bool;

    fn kind(&self) -> Option<EntryType> {
        None
    }
    fn release_date(&self) -> Option<Date> {
        None
    }
    fn rating(&self) -> Option<u8> {
        None
    }
    fn chronological_order(&self) -> Option<u32> {
        None
    }
    fn status(&self) -> Option<CharacterStatus> {
        None
    }
    fn category(&self) -> Option<CharacterCategory> {
        None
    }
    fn first_appearance(&self) -> Option<&str> {
        None
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Searchable for CatalogEntry {
    fn title(&self) -> &str {
        &self.title
    }

    fn phase(&self) -> &str {
        &self.phase
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_folded(&self.title, needle)
            || contains_folded(&self.description, needle)
            || self.cast.iter().any(|name| contains_folded(name, needle))
    }

    fn kind(&self) -> Option<EntryType> {
        Some(self.kind)
    }

    fn release_date(&self) -> Option<Date> {
        Some(self.release_date)
    }

    fn rating(&self) -> Option<u8> {
        self.rating
    }

    fn chronological_order(&self) -> Option<u32> {
        Some(self.chronological_order)
    }
}

impl Searchable for Character {
    fn title(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> &str {
        &self.phase
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_folded(&self.name, needle)
            || contains_folded(&self.description, needle)
            || self
                .real_name
                .as_deref()
                .is_some_and(|name| contains_folded(name, needle))
            || self.powers.iter().any(|p| contains_folded(p, needle))
            || self.affiliation.iter().any(|a| contains_folded(a, needle))
    }

    fn rating(&self) -> Option<u8> {
        Some(self.rating)
    }

    fn status(&self) -> Option<CharacterStatus> {
        Some(self.status)
    }

    fn category(&self) -> Option<CharacterCategory> {
        Some(self.category)
    }

    fn first_appearance(&self) -> Option<&str> {
        Some(&self.first_appearance)
    }
}

fn passes_filters<T: Searchable>(item: &T, query: &Query, needle: &str) -> bool {
    if !needle.is_empty() && !item.matches_text(needle) {
        return false;
    }
    query.kind.admits(item.kind().as_ref())
        && query.phase.admits(Some(item.phase()))
        && query
            .year
            .admits(item.release_date().map(|d| d.year()).as_ref())
        && query.status.admits(item.status().as_ref())
        && query.category.admits(item.category().as_ref())
}

fn compare<T: Searchable>(a: &T, b: &T, sort: SortField, order: SortOrder) -> Ordering {
    let ord = match sort {
        SortField::Title => a
            .title()
            .to_lowercase()
            .cmp(&b.title().to_lowercase())
            .then_with(|| a.title().cmp(b.title())),
        SortField::Phase => a.phase().cmp(b.phase()),
        SortField::Release => a.release_date().cmp(&b.release_date()),
        // highest first regardless of order
        SortField::Rating => {
            return b.rating().unwrap_or(0).cmp(&a.rating().unwrap_or(0));
        }
        SortField::Chronological => a.chronological_order().cmp(&b.chronological_order()),
        SortField::FirstAppearance => a.first_appearance().cmp(&b.first_appearance()),
    };
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

/// Text filter, categorical filters, then a stable sort. The input is never reordered.
pub fn filter_and_sort<'a, T: Searchable>(items: &'a [T], query: &Query) -> Vec<&'a T> {
    let needle = query.search.to_lowercase();
    let mut out: Vec<&T> = items
        .iter()
        .filter(|item| passes_filters(*item, query, &needle))
        .collect();
    out.sort_by(|a, b| compare(*a, *b, query.sort, query.order));
    out
}

#[derive(Debug, Serialize)]
pub struct PhaseGroup<'a, T> {
    pub phase: &'a str,
    pub items: Vec<&'a T>,
}

/// Groups keep the order in which each phase label is first seen.
pub fn group_by_phase<'a, T: Searchable>(items: &[&'a T]) -> Vec<PhaseGroup<'a, T>> {
    let mut groups: Vec<PhaseGroup<'a, T>> = Vec::new();
    for &item in items {
        match groups.iter_mut().find(|g| g.phase == item.phase()) {
            Some(group) => group.items.push(item),
            None => groups.push(PhaseGroup {
                phase: item.phase(),
                items: vec![item],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineMode {
    /// In-universe order.
    #[default]
    Story,
    Release,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem<'a> {
    #[serde(flatten)]
    pub entry: &'a CatalogEntry,
    /// 1-based position among all entries by release date.
    pub release_order: usize,
}

pub fn timeline<'a>(
    entries: &'a [CatalogEntry],
    mode: TimelineMode,
    query: &Query,
) -> Vec<TimelineItem<'a>> {
    let mut by_release: Vec<&CatalogEntry> = entries.iter().collect();
    by_release.sort_by_key(|e| e.release_date);
    let release_order: HashMap<u32, usize> = by_release
        .iter()
        .enumerate()
        .map(|(pos, e)| (e.id, pos + 1))
        .collect();

    let sort = match mode {
        TimelineMode::Story => SortField::Chronological,
        TimelineMode::Release => SortField::Release,
    };
    let view = Query {
        sort,
        order: SortOrder::Asc,
        ..query.clone()
    };
    filter_and_sort(entries, &view)
        .into_iter()
        .map(|entry| TimelineItem {
            entry,
            release_order: release_order.get(&entry.id).copied().unwrap_or(0),
        })
        .collect()
}

fn push_unique<T: PartialEq>(out: &mut Vec<T>, value: T) {
    if !out.contains(&value) {
        out.push(value);
    }
}

/// Values the entry filter panels offer besides `all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFacets {
    pub phases: Vec<String>,
    /// Newest first.
    pub years: Vec<i32>,
    pub types: Vec<EntryType>,
}

pub fn entry_facets(entries: &[CatalogEntry]) -> EntryFacets {
    let mut facets = EntryFacets {
        phases: Vec::new(),
        years: Vec::new(),
        types: Vec::new(),
    };
    for entry in entries {
        if !facets.phases.iter().any(|p| *p == entry.phase) {
            facets.phases.push(entry.phase.clone());
        }
        push_unique(&mut facets.years, entry.release_date.year());
        push_unique(&mut facets.types, entry.kind);
    }
    facets.years.sort_unstable_by(|a, b| b.cmp(a));
    facets
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterFacets {
    pub phases: Vec<String>,
    pub statuses: Vec<CharacterStatus>,
    pub categories: Vec<CharacterCategory>,
}

pub fn character_facets(characters: &[Character]) -> CharacterFacets {
    let mut facets = CharacterFacets {
        phases: Vec::new(),
        statuses: Vec::new(),
        categories: Vec::new(),
    };
    for character in characters {
        if !facets.phases.iter().any(|p| *p == character.phase) {
            facets.phases.push(character.phase.clone());
        }
        push_unique(&mut facets.statuses, character.status);
        push_unique(&mut facets.categories, character.category);
    }
    facets
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewStats {
    pub total: usize,
    pub movies: usize,
    pub series: usize,
    pub specials: usize,
    pub phases: usize,
}

pub fn stats<T: Searchable>(items: &[&T]) -> ViewStats {
    let mut stats = ViewStats {
        total: items.len(),
        ..ViewStats::default()
    };
    let mut phases: Vec<&str> = Vec::new();
    for item in items {
        match item.kind() {
            Some(EntryType::Movie) => stats.movies += 1,
            Some(EntryType::Series) => stats.series += 1,
            Some(EntryType::Special) => stats.specials += 1,
            None => {}
        }
        push_unique(&mut phases, item.phase());
    }
    stats.phases = phases.len();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::query::Selection;
    use crate::catalog::repo::Catalog;
    use time::macros::date;

    fn entry(id: u32, title: &str, release: Date, phase: &str, rating: Option<u8>) -> CatalogEntry {
        CatalogEntry {
            id,
            chronological_order: id,
            title: title.into(),
            release_date: release,
            kind: EntryType::Movie,
            phase: phase.into(),
            description: format!("{title} description"),
            plot: String::new(),
            platforms: vec!["Disney+".into()],
            cast: Vec::new(),
            director: None,
            rating,
        }
    }

    fn phase_one() -> Vec<CatalogEntry> {
        vec![
            entry(1, "Iron Man", date!(2008 - 05 - 02), "Phase 1", Some(5)),
            entry(2, "Thor", date!(2011 - 05 - 06), "Phase 1", Some(4)),
            entry(3, "Black Widow", date!(2021 - 07 - 09), "Phase 4", Some(4)),
        ]
    }

    fn titles<T: Searchable>(items: &[&T]) -> Vec<String> {
        items.iter().map(|i| i.title().to_owned()).collect()
    }

    #[test]
    fn default_query_sorts_by_release_ascending() {
        let mut entries = phase_one();
        entries.reverse();
        let out = filter_and_sort(&entries, &Query::new());
        assert_eq!(titles(&out), ["Iron Man", "Thor", "Black Widow"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let entries = phase_one();
        let out = filter_and_sort(&entries, &Query::new().with_search("IRON"));
        assert_eq!(titles(&out), ["Iron Man"]);

        let out = filter_and_sort(&entries, &Query::new().with_search("widow desc"));
        assert_eq!(titles(&out), ["Black Widow"]);
    }

    #[test]
    fn search_reaches_cast_names() {
        let mut entries = phase_one();
        entries[1].cast = vec!["Chris Hemsworth".into()];
        let out = filter_and_sort(&entries, &Query::new().with_search("hemsworth"));
        assert_eq!(titles(&out), ["Thor"]);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let entries = phase_one();
        assert!(filter_and_sort(&entries, &Query::new().with_search("galactus")).is_empty());
    }

    #[test]
    fn categorical_filters_are_anded() {
        let entries = phase_one();
        let out = filter_and_sort(&entries, &Query::new().with_phase("Phase 1").with_year(2011));
        assert_eq!(titles(&out), ["Thor"]);

        let out = filter_and_sort(&entries, &Query::new().with_type(EntryType::Series));
        assert!(out.is_empty());
    }

    #[test]
    fn entries_never_match_a_character_only_filter() {
        let entries = phase_one();
        let query = Query::new().with_status(CharacterStatus::Active);
        assert!(filter_and_sort(&entries, &query).is_empty());
    }

    #[test]
    fn desc_inverts_release_but_not_rating() {
        let entries = phase_one();
        let desc = Query::new().sorted_by(SortField::Release, SortOrder::Desc);
        assert_eq!(
            titles(&filter_and_sort(&entries, &desc)),
            ["Black Widow", "Thor", "Iron Man"]
        );

        let asc = Query::new().sorted_by(SortField::Rating, SortOrder::Asc);
        let desc = Query::new().sorted_by(SortField::Rating, SortOrder::Desc);
        let a = titles(&filter_and_sort(&entries, &asc));
        let d = titles(&filter_and_sort(&entries, &desc));
        assert_eq!(a, d);
        assert_eq!(a[0], "Iron Man");
        // ties keep input order
        assert_eq!(a[1..], ["Thor", "Black Widow"]);
    }

    #[test]
    fn missing_rating_sorts_last() {
        let mut entries = phase_one();
        entries[0].rating = None;
        let out = filter_and_sort(
            &entries,
            &Query::new().sorted_by(SortField::Rating, SortOrder::Asc),
        );
        assert_eq!(out.last().map(|e| e.id), Some(1));
    }

    #[test]
    fn title_sort_folds_case() {
        let entries = vec![
            entry(1, "ant-Man", date!(2015 - 07 - 17), "Phase 2", None),
            entry(2, "Avengers", date!(2012 - 05 - 04), "Phase 1", None),
            entry(3, "Ant-Man", date!(2018 - 07 - 06), "Phase 3", None),
        ];
        let out = filter_and_sort(
            &entries,
            &Query::new().sorted_by(SortField::Title, SortOrder::Asc),
        );
        assert_eq!(titles(&out), ["Ant-Man", "ant-Man", "Avengers"]);
    }

    #[test]
    fn phase_sort_is_lexicographic() {
        let entries = vec![
            entry(1, "A", date!(2030 - 01 - 01), "Phase 10", None),
            entry(2, "B", date!(2012 - 01 - 01), "Phase 2", None),
        ];
        let out = filter_and_sort(
            &entries,
            &Query::new().sorted_by(SortField::Phase, SortOrder::Asc),
        );
        assert_eq!(titles(&out), ["A", "B"]);
    }

    #[test]
    fn output_does_not_depend_on_input_order() {
        let entries = phase_one();
        let mut shuffled = phase_one();
        shuffled.swap(0, 2);
        let query = Query::new().sorted_by(SortField::Title, SortOrder::Desc);
        assert_eq!(
            titles(&filter_and_sort(&entries, &query)),
            titles(&filter_and_sort(&shuffled, &query))
        );
    }

    #[test]
    fn same_query_on_same_input_gives_same_output() {
        fn ids(items: Vec<&CatalogEntry>) -> Vec<u32> {
            items.iter().map(|e| e.id).collect()
        }
        fn layout(groups: Vec<PhaseGroup<'_, CatalogEntry>>) -> Vec<(String, Vec<u32>)> {
            groups
                .into_iter()
                .map(|g| (g.phase.to_owned(), g.items.iter().map(|e| e.id).collect()))
                .collect()
        }

        let catalog = Catalog::load().unwrap();
        let query = Query::new()
            .with_search("man")
            .sorted_by(SortField::Rating, SortOrder::Asc);
        let first = ids(filter_and_sort(catalog.entries(), &query));
        let second = ids(filter_and_sort(catalog.entries(), &query));
        assert!(!first.is_empty());
        assert_eq!(first, second);

        let grouped = query.clone().grouped();
        let first = filter_and_sort(catalog.entries(), &grouped);
        let second = filter_and_sort(catalog.entries(), &grouped);
        assert_eq!(layout(group_by_phase(&first)), layout(group_by_phase(&second)));
    }

    #[test]
    fn groups_follow_first_seen_phase_order() {
        let entries = vec![
            entry(1, "Black Widow", date!(2021 - 07 - 09), "Phase 4", None),
            entry(2, "Iron Man", date!(2008 - 05 - 02), "Phase 1", None),
            entry(3, "Shang-Chi", date!(2021 - 09 - 03), "Phase 4", None),
        ];
        let sorted = filter_and_sort(
            &entries,
            &Query::new().sorted_by(SortField::Release, SortOrder::Desc),
        );
        let groups = group_by_phase(&sorted);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].phase, "Phase 4");
        assert_eq!(titles(&groups[0].items), ["Shang-Chi", "Black Widow"]);
        assert_eq!(groups[1].phase, "Phase 1");
    }

    #[test]
    fn characters_search_powers_and_filter_by_status() {
        let catalog = Catalog::load().unwrap();
        let out = filter_and_sort(
            catalog.characters(),
            &Query::new().with_search("repulsor"),
        );
        assert_eq!(titles(&out), ["Iron Man"]);

        let query = Query {
            status: Selection::Only(CharacterStatus::Deceased),
            sort: SortField::Title,
            ..Query::new()
        };
        let out = filter_and_sort(catalog.characters(), &query);
        assert_eq!(titles(&out), ["Black Panther", "Black Widow"]);
    }

    #[test]
    fn characters_never_match_a_year_filter() {
        let catalog = Catalog::load().unwrap();
        assert!(filter_and_sort(catalog.characters(), &Query::new().with_year(2008)).is_empty());
    }

    #[test]
    fn timeline_story_mode_uses_chronological_order() {
        let catalog = Catalog::load().unwrap();
        let items = timeline(catalog.entries(), TimelineMode::Story, &Query::new());
        assert_eq!(items.len(), catalog.entries().len());
        let orders: Vec<u32> = items.iter().map(|i| i.entry.chronological_order).collect();
        assert!(orders.windows(2).all(|w| w[0] <= w[1]));

        let iron_man = items.iter().find(|i| i.entry.title == "Iron Man").unwrap();
        assert_eq!(iron_man.release_order, 1);
    }

    #[test]
    fn timeline_release_mode_numbers_from_one() {
        let catalog = Catalog::load().unwrap();
        let items = timeline(
            catalog.entries(),
            TimelineMode::Release,
            &Query::new().sorted_by(SortField::Title, SortOrder::Desc),
        );
        let positions: Vec<usize> = items.iter().map(|i| i.release_order).collect();
        assert_eq!(positions, (1..=items.len()).collect::<Vec<_>>());
    }

    #[test]
    fn timeline_respects_search_and_type() {
        let catalog = Catalog::load().unwrap();
        let items = timeline(
            catalog.entries(),
            TimelineMode::Release,
            &Query::new().with_search("iron").with_type(EntryType::Movie),
        );
        let names: Vec<&str> = items.iter().map(|i| i.entry.title.as_str()).collect();
        assert_eq!(names, ["Iron Man", "Iron Man 2", "Iron Man 3"]);
    }

    #[test]
    fn facets_list_distinct_values() {
        let entries = phase_one();
        let facets = entry_facets(&entries);
        assert_eq!(facets.phases, ["Phase 1", "Phase 4"]);
        assert_eq!(facets.years, [2021, 2011, 2008]);
        assert_eq!(facets.types, [EntryType::Movie]);
    }

    #[test]
    fn stats_count_types_and_phases() {
        let mut entries = phase_one();
        entries[2].kind = EntryType::Series;
        let all = filter_and_sort(&entries, &Query::new());
        let s = stats(&all);
        assert_eq!(
            s,
            ViewStats {
                total: 3,
                movies: 2,
                series: 1,
                specials: 0,
                phases: 2
            }
        );
    }
}
