use std::str::FromStr;

use chrono::NaiveDate;
use opsdesk_types::api::IncidentQuery;
use opsdesk_types::models::{Incident, IncidentStatus, Severity};
use opsdesk_types::validate::ValidationErrors;

/// Query value meaning "no restriction".
const ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssigneeFilter {
    #[default]
    All,
    Unassigned,
    User(String),
}

impl AssigneeFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            "" | ALL => AssigneeFilter::All,
            "unassigned" => AssigneeFilter::Unassigned,
            id => AssigneeFilter::User(id.to_string()),
        }
    }

    fn matches(&self, assignee: Option<&str>) -> bool {
        match self {
            AssigneeFilter::All => true,
            AssigneeFilter::Unassigned => assignee.is_none(),
            AssigneeFilter::User(id) => assignee == Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    DueDate,
}

impl FromStr for SortOrder {
    type Err = ValidationErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "dueDate" => Ok(SortOrder::DueDate),
            other => Err(ValidationErrors::single(
                "sort",
                format!("unknown sort order '{}'", other),
            )),
        }
    }
}

/// Selection and ordering applied to the incident collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub assignee: AssigneeFilter,
    pub search: Option<String>,
    /// Inclusive bounds on the reported day.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort: SortOrder,
}

fn parse_choice<T: FromStr>(
    field: &str,
    value: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        None | Some("") | Some(ALL) => None,
        Some(v) => match v.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                errors.push(field, e.to_string());
                None
            }
        },
    }
}

impl IncidentFilter {
    pub fn from_query(query: &IncidentQuery) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let severity = parse_choice("severity", query.severity.as_deref(), &mut errors);
        let status = parse_choice("status", query.status.as_deref(), &mut errors);
        let sort = match query.sort.as_deref() {
            None | Some("") => SortOrder::default(),
            Some(s) => s.parse().unwrap_or_else(|e: ValidationErrors| {
                errors.errors.extend(e.errors);
                SortOrder::default()
            }),
        };
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                errors.push("from", "Start date must not be after end date");
            }
        }
        errors.into_result()?;

        Ok(Self {
            severity,
            status,
            assignee: query
                .assignee
                .as_deref()
                .map(AssigneeFilter::parse)
                .unwrap_or_default(),
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            from: query.from,
            to: query.to,
            sort,
        })
    }

    /// True when the incident satisfies every supplied predicate.
    pub fn matches(&self, incident: &Incident) -> bool {
        if self.severity.is_some_and(|s| s != incident.severity) {
            return false;
        }
        if self.status.is_some_and(|s| s != incident.status) {
            return false;
        }
        if !self.assignee.matches(incident.assignee_id.as_deref()) {
            return false;
        }

        let day = incident.reported_date.date_naive();
        if self.from.is_some_and(|from| day < from) || self.to.is_some_and(|to| day > to) {
            return false;
        }

        match &self.search {
            Some(needle) => {
                incident.title.to_lowercase().contains(needle)
                    || incident.description.to_lowercase().contains(needle)
                    || incident.tags.iter().any(|t| t.to_lowercase().contains(needle))
            }
            None => true,
        }
    }
}

/// Pure projection: the matching incidents, ordered by `filter.sort`.
/// Ties keep their input order.
pub fn project<'a>(incidents: &'a [Incident], filter: &IncidentFilter) -> Vec<&'a Incident> {
    let mut selected: Vec<&Incident> = incidents.iter().filter(|i| filter.matches(i)).collect();

    match filter.sort {
        SortOrder::Newest => selected.sort_by(|a, b| b.reported_date.cmp(&a.reported_date)),
        SortOrder::Oldest => selected.sort_by(|a, b| a.reported_date.cmp(&b.reported_date)),
        SortOrder::DueDate => selected.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
    }

    selected
}
