//! French clinical terminology

use crate::entities::case::FrenchSymptom;

/// French term (lowercase) to normalized English key
const TRANSLATIONS: &[(&str, &str)] = &[
    // Symptoms
    ("épigastralgie", "epigastric_pain"),
    ("vomissement", "vomiting"),
    ("dysphagie", "dysphagia"),
    ("amaigrissement", "weight_loss"),
    ("asthénie", "fatigue"),
    ("anorexie", "loss_of_appetite"),
    ("hématémèse", "hematemesis"),
    ("méléna", "melena"),
    ("dyspepsie", "dyspepsia"),
    // Locations
    ("estomac", "stomach"),
    ("antrale", "antral"),
    ("fundique", "fundic"),
    ("corporéale", "body"),
    ("cardiaque", "cardiac"),
    // Histology
    ("adénocarcinome", "adenocarcinoma"),
    ("cellules en bague à chaton", "signet_ring_cell"),
    ("peu différencié", "poorly_differentiated"),
    ("bien différencié", "well_differentiated"),
    ("moyennement différencié", "moderately_differentiated"),
    // Procedures
    ("gastrectomie", "gastrectomy"),
    ("gastrectomie totale", "total_gastrectomy"),
    ("gastrectomie partielle", "partial_gastrectomy"),
    ("laparoscopie", "laparoscopic"),
    ("laparotomie", "open_surgery"),
    // Outcomes
    ("complet", "complete"),
    ("partiel", "partial"),
    ("incomplet", "incomplete"),
    ("rémission", "remission"),
    ("récidive", "recurrence"),
    ("progression", "progression"),
];

/// Translate a French clinical term to its English key
///
/// Matching ignores case, surrounding whitespace and accents. Unknown terms
/// come back unchanged.
pub fn translate_term(term: &str) -> &str {
    let folded = fold(term.trim());
    TRANSLATIONS
        .iter()
        .find(|(french, _)| fold(french) == folded)
        .map(|(_, english)| *english)
        .unwrap_or(term)
}

/// Symptoms named anywhere in free text, in declaration order
pub fn detect_french_symptoms(text: &str) -> Vec<FrenchSymptom> {
    let folded = fold(text);
    FrenchSymptom::ALL
        .into_iter()
        .filter(|symptom| folded.contains(&fold(symptom.term())))
        .collect()
}

/// Lowercase and strip the accents used in French clinical notes
fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_known_terms() {
        assert_eq!(translate_term("Épigastralgie"), "epigastric_pain");
        assert_eq!(translate_term("  gastrectomie totale "), "total_gastrectomy");
        assert_eq!(translate_term("cellules en bague à chaton"), "signet_ring_cell");
        assert_eq!(translate_term("RECIDIVE"), "recurrence");
    }

    #[test]
    fn test_translate_unknown_returns_input() {
        assert_eq!(translate_term("Signet Ring"), "Signet Ring");
        assert_eq!(translate_term(""), "");
    }

    #[test]
    fn test_detect_symptoms_in_free_text() {
        let found = detect_french_symptoms("Patient avec épigastralgie et VOMISSEMENT depuis 2 mois");
        assert_eq!(found, vec![FrenchSymptom::Epigastralgie, FrenchSymptom::Vomissement]);
    }

    #[test]
    fn test_detect_symptoms_without_accents() {
        let found = detect_french_symptoms("asthenie, melena");
        assert_eq!(found, vec![FrenchSymptom::Asthenie, FrenchSymptom::Melena]);
        assert!(detect_french_symptoms("no complaints").is_empty());
    }
}
