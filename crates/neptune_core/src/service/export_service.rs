//! Category report over stored places.
//!
//! # Responsibility
//! - Filter stored places by tag and by route distance from a location.
//! - Group the remainder by primary category and render a text listing.
//!
//! # Invariants
//! - Categories render in ascending lexicographic order.
//! - Within a category, places keep store iteration order.
//! - A place with no computable route counts as zero meters (kept).
//! - Export never mutates the store.

use crate::lookup::{LookupError, PlacesApi};
use crate::model::place::Place;
use crate::repo::place_repo::PlaceRepository;
use crate::repo::record_store::{RecordStore, StoreError};
use log::{debug, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub enum ExportError {
    /// A place has an empty category list and cannot be grouped.
    MissingCategory { name: String },
    Lookup(LookupError),
    Store(StoreError),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCategory { name } => write!(f, "place `{name}` has no category"),
            Self::Lookup(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingCategory { .. } => None,
            Self::Lookup(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<LookupError> for ExportError {
    fn from(value: LookupError) -> Self {
        Self::Lookup(value)
    }
}

impl From<StoreError> for ExportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Filters applied before grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Reference location; `None` disables the distance filter.
    pub location: Option<String>,
    /// Maximum route distance in meters, inclusive.
    pub max_distance_meters: u64,
    /// Keep places carrying any of these tags; empty keeps all.
    pub tags: Vec<String>,
}

/// One rendered section of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: String,
    pub names: Vec<String>,
}

pub struct ExportService<S: RecordStore> {
    repo: PlaceRepository<S>,
}

impl<S: RecordStore> ExportService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: PlaceRepository::new(store),
        }
    }

    /// Loads, filters and groups stored places.
    ///
    /// `api` is only consulted when `options.location` is set.
    ///
    /// # Errors
    /// - `Lookup(MissingCredential)` when a location is set without `api`.
    /// - `MissingCategory` when a remaining place has no categories.
    pub fn report(
        &self,
        options: &ExportOptions,
        api: Option<&dyn PlacesApi>,
    ) -> ExportResult<Vec<CategoryGroup>> {
        let stored = self.repo.list()?;
        let total = stored.len();
        let mut places = filter_by_tags(stored, &options.tags);

        if let Some(origin) = options.location.as_deref() {
            let api = api.ok_or(LookupError::MissingCredential)?;
            places = filter_by_distance(api, origin, options.max_distance_meters, places)?;
        }

        let groups = group_by_category(&places)?;
        info!(
            "event=export module=export status=ok stored={total} exported={} categories={}",
            places.len(),
            groups.len()
        );
        Ok(groups)
    }
}

/// Keeps places carrying at least one of `tags`; empty `tags` keeps all.
pub fn filter_by_tags(places: Vec<Place>, tags: &[String]) -> Vec<Place> {
    if tags.is_empty() {
        return places;
    }
    places
        .into_iter()
        .filter(|place| place.has_any_tag(tags))
        .collect()
}

/// Drops places whose route from `origin` is longer than `max_meters`.
pub fn filter_by_distance<A: PlacesApi + ?Sized>(
    api: &A,
    origin: &str,
    max_meters: u64,
    places: Vec<Place>,
) -> ExportResult<Vec<Place>> {
    let mut kept = Vec::with_capacity(places.len());
    for place in places {
        let meters = api.route_distance(origin, &place.formatted_address)?;
        if meters > max_meters {
            debug!("event=export_filter module=export status=excluded meters={meters}");
            continue;
        }
        kept.push(place);
    }
    Ok(kept)
}

/// Groups place names under their primary category, categories sorted.
pub fn group_by_category(places: &[Place]) -> ExportResult<Vec<CategoryGroup>> {
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for place in places {
        let category = place
            .primary_category()
            .ok_or_else(|| ExportError::MissingCategory {
                name: place.name.clone(),
            })?;
        grouped
            .entry(category)
            .or_default()
            .push(place.name.clone());
    }

    Ok(grouped
        .into_iter()
        .map(|(category, names)| CategoryGroup {
            category: category.to_string(),
            names,
        })
        .collect())
}

/// Renders groups as `# Heading` blocks of `* name` lines.
pub fn render_text(groups: &[CategoryGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str("# ");
        out.push_str(&category_title(&group.category));
        out.push('\n');
        for name in &group.names {
            out.push_str("* ");
            out.push_str(name);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// `tourist_attraction` -> `Tourist Attraction`.
pub fn category_title(category: &str) -> String {
    let mut title = String::with_capacity(category.len());
    let mut at_word_start = true;
    for c in category.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_whitespace() {
            at_word_start = true;
            title.push(c);
        } else if at_word_start {
            title.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            title.extend(c.to_lowercase());
        }
    }
    title
}

#[cfg(test)]
mod tests {
    use super::{category_title, render_text, CategoryGroup};

    #[test]
    fn category_title_replaces_underscores_and_capitalizes_words() {
        assert_eq!(category_title("tourist_attraction"), "Tourist Attraction");
        assert_eq!(category_title("food"), "Food");
        assert_eq!(category_title("RV_PARK"), "Rv Park");
    }

    #[test]
    fn render_text_emits_heading_items_and_blank_line() {
        let groups = vec![
            CategoryGroup {
                category: "food".to_string(),
                names: vec!["Taqueria".to_string(), "Bakery".to_string()],
            },
            CategoryGroup {
                category: "lodging".to_string(),
                names: vec!["Inn".to_string()],
            },
        ];

        assert_eq!(
            render_text(&groups),
            "# Food\n* Taqueria\n* Bakery\n\n# Lodging\n* Inn\n\n"
        );
    }
}
