//! Classifier instructions built from the current catalog

use crate::catalog::Catalog;
use crate::config::SearchConfig;

const TITLE_CHARS: usize = 100;
const TITLES_PER_RESEARCHER: usize = 3;
const TOP_AREAS: usize = 15;

/// Compact description of the catalog embedded in the classifier prompt
pub fn researcher_summary(catalog: &Catalog, config: &SearchConfig) -> String {
    let considered = catalog
        .researchers()
        .iter()
        .take(config.summary_researchers);

    let mut area_counts: Vec<(&str, usize)> = Vec::new();
    let mut details = Vec::new();

    for researcher in considered {
        for area in &researcher.areas {
            match area_counts.iter_mut().find(|(a, _)| *a == area.as_str()) {
                Some((_, count)) => *count += 1,
                None => area_counts.push((area.as_str(), 1)),
            }
        }

        if details.len() >= config.summary_detailed {
            continue;
        }

        let mut line = format!(
            "- {} (ID: {}, RUT: {}, Áreas: {})",
            researcher.name,
            researcher.id,
            researcher.rut_ir,
            researcher.areas.join(", ")
        );

        let publications: Vec<String> = catalog
            .publications_for(&researcher.rut_ir)
            .into_iter()
            .take(TITLES_PER_RESEARCHER)
            .map(|p| truncate_chars(&p.title, TITLE_CHARS))
            .collect();
        if !publications.is_empty() {
            line.push_str(&format!("\n  Publicaciones: {}", publications.join("; ")));
        }

        let projects: Vec<String> = catalog
            .projects_for(&researcher.rut_ir)
            .into_iter()
            .take(TITLES_PER_RESEARCHER)
            .map(|p| truncate_chars(&p.title, TITLE_CHARS))
            .collect();
        if !projects.is_empty() {
            line.push_str(&format!("\n  Proyectos: {}", projects.join("; ")));
        }

        details.push(line);
    }

    // stable sort keeps first-seen order among ties
    area_counts.sort_by(|a, b| b.1.cmp(&a.1));
    let top_areas: Vec<String> = area_counts
        .iter()
        .take(TOP_AREAS)
        .map(|(area, count)| format!("{area} ({count})"))
        .collect();

    format!(
        "RESUMEN DE INVESTIGADORAS CON PUBLICACIONES Y PROYECTOS:\n\n\
         ÁREAS OCDE PRINCIPALES:\n{}\n\n\
         INVESTIGADORAS CON SUS TRABAJOS:\n{}\n\n\
         TOTAL DE INVESTIGADORAS: {}\n\
         TOTAL DE ÁREAS: {}\n\
         TOTAL DE PUBLICACIONES: {}\n\
         TOTAL DE PROYECTOS: {}\n\n\
         INSTRUCCIONES PARA BÚSQUEDA POR TÍTULOS:\n\
         - Si el usuario menciona un título de publicación o proyecto específico, \
         busca en los títulos mostrados arriba\n\
         - Si encuentras coincidencia parcial en título, devuelve el nombre de la \
         investigadora asociada en nombres_detectados y usa tipo_busqueda \"nombre\"\n\
         - Ejemplo: \"VALIDACION DE ESCALA SOLEDAD\" → Alba Zambrano Constanzo\n",
        top_areas.join(", "),
        details.join("\n"),
        catalog.researchers().len(),
        catalog.vocabulary().len(),
        catalog.publications().len(),
        catalog.projects().len(),
    )
}

/// Full system instructions for the intent classifier
pub fn system_prompt(catalog: &Catalog, config: &SearchConfig) -> String {
    let areas: Vec<&str> = catalog.vocabulary().iter().collect();

    format!(
        r#"Eres un asistente que interpreta búsquedas de investigadoras del observatorio.

{summary}
ÁREAS OCDE DISPONIBLES: {areas}

Clasifica la consulta como búsqueda por nombre, área, título o híbrida y responde SOLO con JSON válido:
{{
    "tipo_busqueda": "nombre|area|titulo|hibrida",
    "areas_detectadas": ["área"],
    "nombres_detectados": ["nombre"],
    "titulos_detectados": ["fragmento de título"],
    "terminos_busqueda": ["término"],
    "resumen": "breve explicación"
}}

REGLAS:
- "nombre" cuando la consulta menciona personas, "area" cuando menciona disciplinas, "titulo" cuando menciona títulos de publicaciones o proyectos, "hibrida" cuando combina nombres o títulos con áreas
- areas_detectadas debe usar exactamente los valores de la lista de áreas disponibles
- Máximo 5 áreas, 3 nombres, 3 títulos y 5 términos
- Si no detectas nada relevante devuelve listas vacías manteniendo el formato
- Si un título coincide con uno de los trabajos listados, incluye a su autora en nombres_detectados; la búsqueda de investigadoras solo compara nombres, IDs y áreas
- Sin texto adicional fuera del JSON

EJEMPLOS DE DETECCIÓN:
- "Alba Zambrano" → tipo_busqueda: "nombre", nombres_detectados: ["Alba Zambrano"]
- "biotecnología" → tipo_busqueda: "area", areas_detectadas: ["BIOTECNOLOGIA"]
- "validación escala soledad" → tipo_busqueda: "nombre", nombres_detectados: ["Alba Zambrano Constanzo"], titulos_detectados: ["validación escala soledad"]
- "María García matemáticas" → tipo_busqueda: "hibrida", nombres_detectados: ["María García"], areas_detectadas: ["MATEMATICAS"]"#,
        summary = researcher_summary(catalog, config),
        areas = areas.join(", "),
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;

    #[test]
    fn test_summary_includes_titles_and_totals() {
        let catalog = fixtures::catalog();
        let summary = researcher_summary(&catalog, &SearchConfig::default());

        assert!(summary.contains("- Ana Soto (ID: 1, RUT: 100, Áreas: MATEMATICAS, FISICA)"));
        assert!(summary.contains("Publicaciones: Teoria de grafos"));
        assert!(summary.contains("Proyectos: Ecuaciones diferenciales; Geometria"));
        assert!(summary.contains("MATEMATICAS (2)"));
        assert!(summary.contains("TOTAL DE INVESTIGADORAS: 3"));
        assert!(summary.contains("TOTAL DE PROYECTOS: 4"));
    }

    #[test]
    fn test_summary_respects_limits() {
        let catalog = fixtures::catalog();
        let config = SearchConfig {
            summary_researchers: 2,
            summary_detailed: 1,
            ..SearchConfig::default()
        };
        let summary = researcher_summary(&catalog, &config);

        assert!(summary.contains("Ana Soto"));
        assert!(!summary.contains("- Alba Zambrano"));
        assert!(!summary.contains("BIOTECNOLOGIA (1)"));
    }

    #[test]
    fn test_prompt_lists_vocabulary() {
        let prompt = system_prompt(&fixtures::catalog(), &SearchConfig::default());
        assert!(prompt.contains("BIOTECNOLOGIA, FISICA, MATEMATICAS, PSICOLOGIA"));
    }

    #[test]
    fn test_prompt_maps_titles_to_researchers() {
        let prompt = system_prompt(&fixtures::catalog(), &SearchConfig::default());

        assert!(prompt.contains("INSTRUCCIONES PARA BÚSQUEDA POR TÍTULOS"));
        assert!(prompt.contains("devuelve el nombre de la investigadora asociada"));
        assert!(prompt.contains("\"VALIDACION DE ESCALA SOLEDAD\" → Alba Zambrano Constanzo"));
        assert!(prompt.contains("EJEMPLOS DE DETECCIÓN"));
        assert!(prompt.contains("\"María García matemáticas\" → tipo_busqueda: \"hibrida\""));
        assert!(prompt.contains("\"biotecnología\" → tipo_busqueda: \"area\""));
    }

    #[test]
    fn test_truncate_is_char_based() {
        assert_eq!(truncate_chars("ñandú", 3), "ñan");
    }
}
