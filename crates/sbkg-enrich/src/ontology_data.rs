//! Bundled ontology term lists (§4.8): a small curated slice of each
//! supported ontology, scoped to space-biology domain terms, standing in
//! for a full ontology download the pipeline has no network source for.

use sbkg_config::Ontology;

pub struct OntologyTerm {
    pub ontology: Ontology,
    pub term_id: &'static str,
    pub preferred_label: &'static str,
    pub synonyms: &'static [&'static str],
}

pub fn bundled_terms() -> &'static [OntologyTerm] {
    &[
        OntologyTerm { ontology: Ontology::Go, term_id: "GO:0001503", preferred_label: "ossification", synonyms: &["bone formation"] },
        OntologyTerm { ontology: Ontology::Go, term_id: "GO:0045453", preferred_label: "bone resorption", synonyms: &["osteolysis"] },
        OntologyTerm { ontology: Ontology::Go, term_id: "GO:0006979", preferred_label: "response to oxidative stress", synonyms: &["oxidative stress response"] },
        OntologyTerm { ontology: Ontology::Hpo, term_id: "HP:0000939", preferred_label: "osteoporosis", synonyms: &["low bone density"] },
        OntologyTerm { ontology: Ontology::Hpo, term_id: "HP:0003202", preferred_label: "skeletal muscle atrophy", synonyms: &["muscle atrophy", "muscle wasting"] },
        OntologyTerm { ontology: Ontology::Hpo, term_id: "HP:0002960", preferred_label: "autoimmunity", synonyms: &["immune dysfunction"] },
        OntologyTerm { ontology: Ontology::Mondo, term_id: "MONDO:0005298", preferred_label: "osteoporosis", synonyms: &["bone loss disease"] },
        OntologyTerm { ontology: Ontology::Mondo, term_id: "MONDO:0004995", preferred_label: "cancer", synonyms: &["malignant neoplasm"] },
        OntologyTerm { ontology: Ontology::Mondo, term_id: "MONDO:0005441", preferred_label: "cataract", synonyms: &["cataracts"] },
        OntologyTerm { ontology: Ontology::Envo, term_id: "ENVO:01000999", preferred_label: "microgravity environment", synonyms: &["microgravity", "weightlessness"] },
        OntologyTerm { ontology: Ontology::Envo, term_id: "ENVO:01000328", preferred_label: "ionizing radiation environment", synonyms: &["cosmic radiation", "ionizing radiation"] },
        OntologyTerm { ontology: Ontology::Cl, term_id: "CL:0000062", preferred_label: "osteoblast", synonyms: &["bone-forming cell"] },
        OntologyTerm { ontology: Ontology::Cl, term_id: "CL:0000092", preferred_label: "osteoclast", synonyms: &["bone-resorbing cell"] },
        OntologyTerm { ontology: Ontology::Cl, term_id: "CL:0000542", preferred_label: "lymphocyte", synonyms: &["immune cell"] },
        OntologyTerm { ontology: Ontology::Uberon, term_id: "UBERON:0001474", preferred_label: "bone tissue", synonyms: &["osseous tissue"] },
        OntologyTerm { ontology: Ontology::Uberon, term_id: "UBERON:0001630", preferred_label: "muscle organ", synonyms: &["skeletal muscle"] },
    ]
}
