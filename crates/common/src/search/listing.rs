//! List filters over catalog records

use crate::catalog::{Project, Publication, Researcher};

/// Researchers matching the term and carrying every selected area.
///
/// The term is compared lower-cased against the id, the name and the joined
/// area string. Areas are matched case-sensitively as substrings of the
/// joined area string.
pub fn filter_researchers<'a, S: AsRef<str>>(
    researchers: &'a [Researcher],
    term: &str,
    areas: &[S],
) -> Vec<&'a Researcher> {
    let term = term.trim().to_lowercase();

    researchers
        .iter()
        .filter(|researcher| {
            let area_text = researcher.area_text();

            let term_matches = term.is_empty()
                || researcher.id.to_string().contains(&term)
                || researcher.name.to_lowercase().contains(&term)
                || area_text.to_lowercase().contains(&term);

            term_matches && areas.iter().all(|area| area_text.contains(area.as_ref()))
        })
        .collect()
}

pub fn filter_projects<'a, I>(projects: I, term: &str) -> Vec<&'a Project>
where
    I: IntoIterator<Item = &'a Project>,
{
    let term = term.trim().to_lowercase();
    projects
        .into_iter()
        .filter(|project| matches_any(&project.searchable_fields(), &term))
        .collect()
}

pub fn filter_publications<'a, I>(publications: I, term: &str) -> Vec<&'a Publication>
where
    I: IntoIterator<Item = &'a Publication>,
{
    let term = term.trim().to_lowercase();
    publications
        .into_iter()
        .filter(|publication| matches_any(&publication.searchable_fields(), &term))
        .collect()
}

fn matches_any(fields: &[String], lowered_term: &str) -> bool {
    lowered_term.is_empty()
        || fields
            .iter()
            .any(|field| field.to_lowercase().contains(lowered_term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{self, researcher};

    #[test]
    fn test_areas_use_and_semantics() {
        let researchers = vec![
            researcher(1, "R1", &["X", "Y"], "1"),
            researcher(2, "R2", &["X"], "2"),
        ];

        let hits = filter_researchers(&researchers, "", &["X", "Y"]);
        assert_eq!(hits.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);

        let hits = filter_researchers(&researchers, "", &["X"]);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_term_matches_id_name_and_areas() {
        let catalog = fixtures::catalog();
        let researchers = catalog.researchers();
        let none: [&str; 0] = [];

        assert_eq!(filter_researchers(researchers, " ZAMBRANO ", &none).len(), 1);
        assert_eq!(filter_researchers(researchers, "3", &none)[0].name, "Bruno Diaz");
        assert_eq!(filter_researchers(researchers, "matematicas", &none).len(), 2);
        assert_eq!(filter_researchers(researchers, "", &none).len(), 3);
    }

    #[test]
    fn test_area_match_is_case_sensitive() {
        let catalog = fixtures::catalog();
        assert!(filter_researchers(catalog.researchers(), "", &["matematicas"]).is_empty());
    }

    #[test]
    fn test_project_and_publication_search() {
        let catalog = fixtures::catalog();

        let hits = filter_projects(catalog.projects(), "2021");
        assert_eq!(hits.len(), 2);
        assert_eq!(filter_projects(catalog.projects(), "di-3")[0].title, "Celulas madre");
        assert_eq!(filter_projects(catalog.projects(), "").len(), 4);

        assert_eq!(filter_publications(catalog.publications(), "SOLEDAD").len(), 1);
        assert_eq!(filter_publications(catalog.publications(), "q1").len(), 2);
    }
}
