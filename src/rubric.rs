//! Rubric data model: categories, questions, score scales and verdict bands.
//!
//! A rubric is pure configuration: ordered categories of ordered questions,
//! an integer score scale, and the thresholds used to turn aggregated scores
//! into a verdict. All validation happens at construction; a `Rubric` that
//! exists is well-formed.

use serde::Serialize;
use thiserror::Error;

use crate::prompts::{ScorePrompt, CLUSTER_PROMPT, STARTUP_PROMPT};

// =============================================================================
// Score scale
// =============================================================================

/// Closed integer scoring interval `[0, max]` plus the presentation thresholds
/// tied to it.
#[derive(Debug, Clone, Copy)]
pub struct ScoreScale {
    /// Highest admissible score (inclusive).
    pub max: u8,
    /// Per-level guide text embedded in scoring prompts.
    pub guide: &'static str,
    /// Mean-score cut point at or above which a category reads as strong.
    pub strong_cut: f64,
    /// Mean-score cut point at or above which a category reads as moderate.
    pub moderate_cut: f64,
}

impl ScoreScale {
    /// 0–3 scale used by the startup application rubrics.
    pub const STARTUP: ScoreScale = ScoreScale {
        max: 3,
        guide: "0 = Ikke besvart eller vesentlige mangler\n\
                1 = Svakt eller utydelig besvart\n\
                2 = Delvis besvart, mangler konkretisering\n\
                3 = Godt og konkret besvart",
        strong_cut: 2.5,
        moderate_cut: 1.5,
    };

    /// 0–4 scale used by the weighted cluster rubric.
    pub const CLUSTER: ScoreScale = ScoreScale {
        max: 4,
        guide: "0 = Ikke besvart/vesentlige mangler\n\
                1 = Utydelig/svake beskrivelser og eksempler\n\
                2 = Mindre gode beskrivelser med vage/overordnede eksempler\n\
                3 = Gode beskrivelser som formidler relevante og konkrete eksempler\n\
                4 = Meget gode beskrivelser som formidler veldig relevante og konkrete eksempler",
        strong_cut: 3.2,
        moderate_cut: 2.4,
    };

    /// Whether an integer score falls inside `[0, max]`.
    pub fn contains(&self, score: i64) -> bool {
        (0..=self.max as i64).contains(&score)
    }

    /// Severity code for a mean score on this scale. The report renderer uses
    /// this verbatim; it owns no cut points of its own.
    pub fn severity(&self, mean_score: f64) -> Severity {
        if mean_score >= self.strong_cut {
            Severity::Strong
        } else if mean_score >= self.moderate_cut {
            Severity::Moderate
        } else {
            Severity::Weak
        }
    }
}

/// Category-level strength code derived from a mean score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Strong,
    Moderate,
    Weak,
}

// =============================================================================
// Verdict banding
// =============================================================================

/// Monotonic step function over the composite score. Lower bounds are
/// inclusive: a composite exactly on a cut lands in the higher band.
#[derive(Debug, Clone, Copy)]
pub struct VerdictBands {
    pub excellent: f64,
    pub good: f64,
    pub needs_improvement: f64,
}

impl VerdictBands {
    /// Bands for the unweighted startup composite (0–3).
    pub const STARTUP: VerdictBands = VerdictBands {
        excellent: 2.5,
        good: 2.0,
        needs_improvement: 1.5,
    };

    /// Bands for the weighted cluster composite (0–100).
    pub const CLUSTER: VerdictBands = VerdictBands {
        excellent: 80.0,
        good: 65.0,
        needs_improvement: 50.0,
    };

    pub fn classify(&self, composite: f64) -> Verdict {
        if composite >= self.excellent {
            Verdict::Excellent
        } else if composite >= self.good {
            Verdict::Good
        } else if composite >= self.needs_improvement {
            Verdict::NeedsImprovement
        } else {
            Verdict::Weak
        }
    }
}

/// Qualitative band for a whole evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Good,
    NeedsImprovement,
    Weak,
}

impl Verdict {
    fn index(self) -> usize {
        match self {
            Verdict::Excellent => 0,
            Verdict::Good => 1,
            Verdict::NeedsImprovement => 2,
            Verdict::Weak => 3,
        }
    }
}

// =============================================================================
// Rubric + categories
// =============================================================================

/// One named group of questions, optionally carrying a relative weight.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub weight: Option<f64>,
    pub questions: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, questions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            weight: None,
            questions,
        }
    }

    pub fn weighted(name: impl Into<String>, weight: f64, questions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            weight: Some(weight),
            questions,
        }
    }
}

/// A fully validated rubric. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Rubric {
    name: String,
    title: String,
    scale: ScoreScale,
    bands: VerdictBands,
    narratives: [&'static str; 4],
    prompt: ScorePrompt,
    categories: Vec<Category>,
    weighted: bool,
}

/// Borrowed view of one (category, question) pair in rubric order.
#[derive(Debug, Clone, Copy)]
pub struct QuestionRef<'a> {
    pub category: &'a str,
    pub weight: Option<f64>,
    pub question: &'a str,
}

impl Rubric {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        scale: ScoreScale,
        bands: VerdictBands,
        narratives: [&'static str; 4],
        prompt: ScorePrompt,
        categories: Vec<Category>,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();

        if categories.is_empty() {
            return Err(ConfigurationError::EmptyRubric(name));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(categories.len());
        for category in &categories {
            if category.questions.is_empty() {
                return Err(ConfigurationError::EmptyCategory(category.name.clone()));
            }
            if seen.contains(&category.name.as_str()) {
                return Err(ConfigurationError::DuplicateCategory(category.name.clone()));
            }
            seen.push(&category.name);
            if let Some(w) = category.weight {
                if w <= 0.0 || !w.is_finite() {
                    return Err(ConfigurationError::InvalidWeight(category.name.clone(), w));
                }
            }
        }

        let weighted_count = categories.iter().filter(|c| c.weight.is_some()).count();
        if weighted_count != 0 && weighted_count != categories.len() {
            return Err(ConfigurationError::MixedWeights(name));
        }

        Ok(Self {
            name,
            title: title.into(),
            scale,
            bands,
            narratives,
            prompt,
            categories,
            weighted: weighted_count != 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn scale(&self) -> ScoreScale {
        self.scale
    }

    pub fn bands(&self) -> VerdictBands {
        self.bands
    }

    pub fn prompt(&self) -> ScorePrompt {
        self.prompt
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Whether every category carries a weight.
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }

    /// Every (category, question) pair in declared order.
    pub fn questions(&self) -> impl Iterator<Item = QuestionRef<'_>> {
        self.categories.iter().flat_map(|c| {
            c.questions.iter().map(move |q| QuestionRef {
                category: &c.name,
                weight: c.weight,
                question: q,
            })
        })
    }

    /// Human-readable interpretation line for a verdict on this rubric.
    pub fn narrative(&self, verdict: Verdict) -> &'static str {
        self.narratives[verdict.index()]
    }
}

// =============================================================================
// Configuration errors
// =============================================================================

/// Fatal precondition failures, reported before any scoring starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("rubric '{0}' has no categories")]
    EmptyRubric(String),

    #[error("category '{0}' has no questions")]
    EmptyCategory(String),

    #[error("duplicate category name '{0}'")]
    DuplicateCategory(String),

    #[error("category '{0}' has invalid weight {1}")]
    InvalidWeight(String, f64),

    #[error("rubric '{0}' mixes weighted and unweighted categories")]
    MixedWeights(String),

    #[error("unknown rubric '{name}' (available: {available})")]
    UnknownRubric { name: String, available: String },

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

// =============================================================================
// Built-in rubric registry
// =============================================================================

/// The closed set of rubric names accepted by [`Rubric::by_name`].
pub const RUBRIC_NAMES: &[&str] = &["oppstart1", "oppstart2", "oppstart3", "nic"];

const STARTUP_NARRATIVES: [&str; 4] = [
    "Utmerket søknad! Høy sannsynlighet for godkjenning.",
    "God søknad med potensial. Noen forbedringer kan styrke den.",
    "Søknaden trenger forbedringer i flere områder.",
    "Søknaden har betydelige svakheter som bør adresseres.",
];

const CLUSTER_NARRATIVES: [&str; 4] = [
    "Utmerket klyngesøknad! Høy sannsynlighet for godkjenning.",
    "God klyngesøknad med potensial. Noen forbedringer kan styrke den.",
    "Klyngesøknaden trenger forbedringer i flere områder.",
    "Klyngesøknaden har betydelige svakheter som bør adresseres.",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Rubric {
    /// Resolve a built-in rubric by name.
    pub fn by_name(name: &str) -> Result<Rubric, ConfigurationError> {
        match name {
            "oppstart1" => Ok(Self::oppstart_intro()),
            "oppstart2" => Ok(Self::oppstart_full("oppstart2", "Innovasjon Norge – Oppstart 2")),
            "oppstart3" => Ok(Self::oppstart_full("oppstart3", "Innovasjon Norge – Oppstart 3")),
            "nic" => Ok(Self::nic_cluster()),
            other => Err(ConfigurationError::UnknownRubric {
                name: other.to_string(),
                available: RUBRIC_NAMES.join(", "),
            }),
        }
    }

    /// Unweighted 0–3 rubric for first-stage startup applications.
    pub fn oppstart_intro() -> Rubric {
        let categories = vec![
            Category::new(
                "Problemløsning og marked",
                strings(&[
                    "Hvor godt er problemet/behovet/dagens situasjon beskrevet, inkludert dagens alternative løsninger?",
                    "Hvor godt er løsningsbeskrivelsen beskrevet og er den tydelig avgrenset?",
                    "Hvor godt er dagens konkurrenter og konkurransebilde beskrevet?",
                    "Hvor godt er forskjellene og forbedringene fra dagens alternativer beskrevet?",
                    "Hvor tydelig er de unike aspektene ved løsningen beskrevet (det må være VESENTLIGE forskjeller fra dagens løsninger)?",
                ]),
            ),
            Category::new(
                "Verdiskapning",
                strings(&[
                    "Hvor godt er det kommersielle potensialet for selskapet beskrevet? (kunder, inntekt, arbeidsplasser o.l.)",
                    "Hvor godt er verdiskapningen for samfunnet beskrevet?",
                    "Hvor er gevinster som miljø, bærekraft, likestilling og mangfold beskrevet?",
                    "Hvor tydelig og realistisk er forretningsmodellen beskrevet?",
                    "Hvor godt er kundeverdien beskrevet?",
                    "Hvor godt er kundegruppe og markedet beskrevet?",
                ]),
            ),
            Category::new(
                "Gjennomføringsevne",
                strings(&[
                    "Hvor tydelig og avgrenset er prosjektet beskrevet?",
                    "Hvor godt er målsettingen for prosjektet tilpasset hensikten med ordningen -> validering av problem, løsning og marked?",
                    "Hvor godt er suksesskriterier for å kunne gå videre med forretningsideen etter endt prosjekt beskrevet?",
                    "Hvor godt er teamets og selskapets relevante erfaring og relevant kompetanse beskrevet?",
                    "Hvor er investorer, inkubatorer, rådgivere eller andre støttespillere beskrevet?",
                    "Hvor godt er kundegruppe og markedet beskrevet?",
                ]),
            ),
            Category::new(
                "Utløsende effekt av støtte fra Innovasjon Norge",
                strings(&[
                    "Hvor godt kommer det frem at dere er avhengig av tilskudd for å realisere prosjektet?",
                    "Hvor godt er risikoen prosjektet skal redusere beskrevet i søknaden?",
                    "Hvis dere har investorer som ønsker å investere i dere, i etterkant av prosjektet, er dette beskrevet?",
                ]),
            ),
            Category::new(
                "Søknadsutforming og detaljer",
                strings(&[
                    "Svarer søknaden på alle krav som etterspørres i IN sin søknadsportal?",
                    "Er språket korrekturlest, både med tanke på tegnsetting og rettskrivning? (Nei = 0, Ja =3)",
                    "Hvor overbevisende/tillitsvekkende er språket i søknaden?",
                    "I hvor stor grad er språket kort og konsist?",
                    "I hvor stor grad er 'buzzwords' unngått?",
                    "I hvor stor grad har det blitt benyttet kildehenvisninger for dataunderlag og argumenter?",
                ]),
            ),
            Category::new(
                "Vedlegg (Nei = 0, Ja = 3)",
                strings(&[
                    "Finansiell modell eller likviditetsbudsjett for selskapet",
                    "Selskaspresentasjon / Pitch-deck",
                    "Prosjektpresentasjon",
                    "Forretningsmodell (hvis ikke en del av selskapspresentasjonen), som 'lean business canvas' eller tilsvarende",
                    "Konkurrentanalyse (hvis ikke en del av prosjektpresentasjon)",
                    "Siste til løsningsforslag",
                    "For vedlegg utarbeidet i Excel-format, er disse sendt i originalformatet?",
                ]),
            ),
        ];

        Self::new(
            "oppstart1",
            "Innovasjon Norge – Oppstart 1",
            ScoreScale::STARTUP,
            VerdictBands::STARTUP,
            STARTUP_NARRATIVES,
            STARTUP_PROMPT,
            categories,
        )
        .expect("built-in rubric is well-formed")
    }

    /// Unweighted 0–3 rubric for later-stage startup applications. Oppstart 2
    /// and 3 share the same question set.
    pub fn oppstart_full(name: &str, title: &str) -> Rubric {
        let categories = vec![
            Category::new(
                "Problemløsning og marked",
                strings(&[
                    "Hvor godt er problemet/behovet/dagens situasjon beskrevet, inkludert dagens alternative løsninger?",
                    "Hvor godt er løsningsbeskrivelsen beskrevet og er den tydelig avgrenset?",
                    "Hvor godt er FoU-utfordringer knyttet til løsningen beskrevet?",
                    "Hvor godt er det forklart hvorfor FoU-utfordringer ikke er løst tidligere?",
                    "Hvor godt er dagens konkurrenter og konkurransebilde beskrevet?",
                    "Hvor godt beskrevet er forskjellene og forbedringene fra dagens alternativer?",
                    "Hvor tydelig er de unike aspektene ved løsningen beskrevet (det må være vesentlige forskjeller fra dagens løsninger)?",
                ]),
            ),
            Category::new(
                "Kapning",
                strings(&[
                    "Hvor godt er den kortsiktige effekten av prosjektresultatet for selskapet beskrevet? (kunder, inntekt, arbeidsplasser o.l.)",
                    "Hvor godt er den langsiktige effekten av prosjektresultatet for selskapet beskrevet? (kunder, inntekt, arbeidsplasser o.l.)",
                    "Hvor tydelig er det at prosjektet bygger opp under selskapets langsiktige ambisjon og strategi?",
                    "Hvor godt er verdiskapningen for samfunnet beskrevet?",
                    "Hvor godt er miljøgevinsten beskrevet?",
                    "Hvor godt er gevinster som bærekraft, likestilling og mangfold beskrevet?",
                    "Hvor toverig fremstår markedsbeskrivelsen, i både nasjonal og internasjonal perspektiv?",
                    "Hvor tydelig og realistisk er forretningsmodellen beskrevet?",
                    "Hvor godt er kundeverdien beskrevet?",
                    "Hvor godt er interaksjon med kunder beskrevet som en del av prosjektet?",
                ]),
            ),
            Category::new(
                "Gjennomføringsevne",
                strings(&[
                    "Hvor godt er selskapets nåværende situasjon, målsetting og strategi beskrevet?",
                    "Hvor tydelig og avgrenset er prosjektet beskrevet?",
                    "Hvor godt er aktivitetene/arbeidspakkene i prosjektet beskrevet?",
                    "Hvor godt er roller og ansvar beskrevet?",
                    "For FoU-prosjekter: hvor godt er håndteringen av disse beskrevet?",
                    "Hvor godt er teamets og selskapets erfaring og kompetanse beskrevet?",
                    "Hvis dere har partnere eller kunder som er en del av prosjektet, hvor godt beskrevet er disse inkludert bidrag under og etter prosjektet?",
                    "Hvor gode forutsetninger har selskapet for å kunne realisere 'go-to-market'-planer? f.eks. etablering av kanaler til markedet?",
                    "Hvis dere har leverandører, hvor godt er disse og deres fortinn beskrevet?",
                    "Hvor godt er finansieringsplanen under og etter prosjektet beskrevet i tekst og vedlegg? Er dere tydelig likviditet i perioden?",
                    "Hvor godt kommer det frem at selskapet har spesifikke fordeler som gjør selskapet spesielt egnet til å forvalte investeringen?",
                ]),
            ),
            Category::new(
                "Statsstøtte-effekt av støtte fra Innovasjon Norge",
                strings(&[
                    "Hvor godt kommer det frem at dere er avhengig av støtte/lån for å realisere/akselerere prosjektet?",
                    "Hvor godt er teknisk risiko beskrevet i søknaden?",
                    "Hvor godt er markeds-/kommersiell risiko beskrevet i søknaden?",
                    "Hvor godt er klimarisiko (negativ effekt av prosjekt-antagelser og klimaendringer) beskrevet?",
                    "Totalt sett, er risikoen i prosjektet stor nok til at det aktuelt for en bank eller investor å investere i prosjektet uten statsstøtte?",
                    "Hvor godt beskrevet er scenarioene med og uten støtte fra Innovasjon Norge for selskapet?",
                    "Hvor godt er et potensielle investorer beskrevet, helst navngitt, gitt støtte fra Innovasjon Norge? Beskrevet i tekst eller vedlegg?",
                    "Hvor godt kommer det frem at dere har kunder som vil kjøpe, gitt gjennomføring av prosjekt (LOI eller tilsvarende)?",
                    "Hvor godt er markedssituasjonen beskrevet, og hvordan støtte fra IN kan posisjonere dere?",
                ]),
            ),
            Category::new(
                "Gjennomføring og detaljer",
                strings(&[
                    "Svarer søknaden på alle krav som etterspørres i IN sin søknadsportal?",
                    "Er språket korrekturlest, både med tanke på tegnsetting og rettskrivning? (Nei = 0, Ja =3)",
                    "Hvor overbevisende/tillitsvekkende er språket i søknaden?",
                    "I hvor stor grad er språket kort og konsist?",
                    "I hvor stor grad er 'buzzwords' unngått?",
                    "I hvor stor grad har det blitt benyttet kildehenvisninger for dataunderlag og argumenter?",
                    "Er timesatser for de forskjellige personalkategoriene innenfor grensene til IN (Nei = 0, Ja =3)",
                    "Er maksimal støttegrad for de forskjellige aktivitetene tilpasset deres bedrift? (Nei = 0, Ja =3)",
                    "Hvis det søkes om lån, hvor godt er sikkerheten for lånet beskrevet og dokumentert?",
                    "Er alle tall dobbeltsjekket opp mot prosjektoppsettet deres?",
                ]),
            ),
            Category::new(
                "Krav fra IN",
                strings(&[
                    "Krav fra IN: Siste års regnskap",
                    "Krav fra IN: Perioderegnskab, ikke eldre enn 3 mnd",
                    "Krav fra IN: Driftsbudsjett for bedriftens virksomhet de neste 3 årene",
                    "Krav fra IN: Eventuelle budsjetter/lønnsomhetsberegninger",
                    "Selskapsrepresentasjon",
                    "Prosjektpresentasjon",
                    "Organisasjonskart inkludert CV på nøkkelpersoner i prosjektet",
                    "Kundeavtaler, Letter of Intent (LOI), eller annet som understreker markedsbehovet",
                    "Termsheet, Intensjonsbrev eller lignende som dokumenterer at dere har investor som vil investere gitt støtte fra IN.",
                    "For vedlegg utarbeidet i Excel-format, er disse sendt i originalformatet?",
                ]),
            ),
        ];

        Self::new(
            name,
            title,
            ScoreScale::STARTUP,
            VerdictBands::STARTUP,
            STARTUP_NARRATIVES,
            STARTUP_PROMPT,
            categories,
        )
        .expect("built-in rubric is well-formed")
    }

    /// Weighted 0–4 rubric for NIC cluster program applications. Weights are
    /// percentage contributions (summing to 100 here, though the aggregator
    /// does not require it).
    pub fn nic_cluster() -> Rubric {
        let categories = vec![
            Category::weighted(
                "Bakgrunn for klyngen",
                10.0,
                strings(&[
                    "Beskriver klyngens opprinnelse og hvorfor den ble etablert",
                    "Beskriver klyngens målgruppe(r), hvilke utfordringer den adresserer og hvorfor medlemmene ikke klarer å løse disse utfordringene individuelt",
                    "Beskriver klyngens egnethet til å løse akkurat disse utfordringene",
                ]),
            ),
            Category::weighted(
                "Klyngens visjon, misjon og hovedmål",
                15.0,
                strings(&[
                    "Beskriver klyngens visjon (hva vil de gjerne bli)",
                    "Beskriver klyngens misjon (hvorfor man er til)",
                    "Beskriver klyngens SMARTE mål som er målbare og realistiske",
                    "Beskriver klyngens SMARTE mål knyttet opp mot klyngeprogrammets mål og ESG",
                    "Hvis relevant: Beskriver klyngens bidrag til oppfyllelse av FNs bærekraftsmål",
                ]),
            ),
            Category::weighted(
                "Fokusområder, aktiviteter, tjenester og gjennomføringsplan",
                25.0,
                strings(&[
                    "Beskriver klyngens fokusområder",
                    "Beskriver hva som er forventet resultatmål (konkrete og kvantifiserbare)",
                    "Beskriver hvilke aktiviteter klyngen skal arbeide med og hvordan disse underbygger resultatmålene",
                    "Beskriver hvordan klyngens aktiviteter er relevante for klyngens medlemmer",
                    "Beskriver en gjennomføringsplan som inkluderer hvem som skal gjøre hva og hvordan",
                ]),
            ),
            Category::weighted(
                "Fremtidige effekter av klyngens arbeid",
                20.0,
                strings(&[
                    "Beskriver fremtidige effekter av klyngens arbeid (både kort og lang sikt)",
                    "Beskriver en kobling opp mot klyngeprogrammets mål",
                    "Beskriver fremtidige effekter mot ESG, lønnsomhet og medlemsbedriftenes konkurransekraft",
                    "Hvis relevant: Beskriver et potensial i klyngens arbeid for medlemmene (eks økte markedsandeler, gevinster og/eller omstilling)",
                ]),
            ),
            Category::weighted(
                "Klyngens ressursgrunnlag",
                20.0,
                strings(&[
                    "Beskriver klyngens medlemsmasse og sammensetning",
                    "Beskriver klyngemedlemmenes motivasjon og ambisjon for medlemskap i klyngen",
                    "Beskriver klyngens interne ressursgrunnlag: klyngeledelse, styre og kompetanse",
                    "Beskriver klyngens rolle i forhold til klyngens medlemmer og hvordan man organiserer arbeidet",
                    "Beskriver sentrale aktiviteter i klyngen og medlemmenes forpliktelser til disse",
                ]),
            ),
            Category::weighted(
                "Klyngens rolle",
                10.0,
                strings(&[
                    "Beskriver hvorfor klyngen trengs i sitt marked/område",
                    "Beskriver hvilken posisjon klyngen har i dag, og hvilken posisjon den skal ta nasjonalt evt internasjonalt",
                    "Beskriver hvordan klyngens arbeid kan bidra til realisering av regionale og nasjonale utviklingsplaner",
                    "Beskriver klyngens samarbeidspartnere utenfor klyngen (eks andre klynger eller relevante aktører/miljø)",
                    "Beskriver klyngens prosessmetodikk for å identifisere og etablere prosjekter/tjenester for klyngens medlemmer",
                ]),
            ),
        ];

        Self::new(
            "nic",
            "NIC Klyngeevaluering",
            ScoreScale::CLUSTER,
            VerdictBands::CLUSTER,
            CLUSTER_NARRATIVES,
            CLUSTER_PROMPT,
            categories,
        )
        .expect("built-in rubric is well-formed")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str, n: usize) -> Category {
        Category::new(name, (0..n).map(|i| format!("q{i}")).collect())
    }

    #[test]
    fn rejects_empty_category() {
        let err = Rubric::new(
            "t",
            "t",
            ScoreScale::STARTUP,
            VerdictBands::STARTUP,
            STARTUP_NARRATIVES,
            STARTUP_PROMPT,
            vec![cat("a", 2), cat("b", 0)],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyCategory(name) if name == "b"));
    }

    #[test]
    fn rejects_mixed_weighting() {
        let err = Rubric::new(
            "t",
            "t",
            ScoreScale::CLUSTER,
            VerdictBands::CLUSTER,
            CLUSTER_NARRATIVES,
            CLUSTER_PROMPT,
            vec![
                Category::weighted("a", 50.0, vec!["q".into()]),
                Category::new("b", vec!["q".into()]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::MixedWeights(_)));
    }

    #[test]
    fn rejects_duplicate_category_and_bad_weight() {
        let err = Rubric::new(
            "t",
            "t",
            ScoreScale::STARTUP,
            VerdictBands::STARTUP,
            STARTUP_NARRATIVES,
            STARTUP_PROMPT,
            vec![cat("a", 1), cat("a", 1)],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateCategory(_)));

        let err = Rubric::new(
            "t",
            "t",
            ScoreScale::CLUSTER,
            VerdictBands::CLUSTER,
            CLUSTER_NARRATIVES,
            CLUSTER_PROMPT,
            vec![Category::weighted("a", 0.0, vec!["q".into()])],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidWeight(_, _)));
    }

    #[test]
    fn builtin_registry_resolves_all_names() {
        for name in RUBRIC_NAMES {
            let rubric = Rubric::by_name(name).unwrap();
            assert_eq!(rubric.name(), *name);
            assert!(rubric.question_count() > 0);
        }
        assert!(matches!(
            Rubric::by_name("bogus"),
            Err(ConfigurationError::UnknownRubric { .. })
        ));
    }

    #[test]
    fn nic_rubric_is_weighted_and_sums_to_100() {
        let rubric = Rubric::by_name("nic").unwrap();
        assert!(rubric.is_weighted());
        assert_eq!(rubric.scale().max, 4);
        let total: f64 = rubric.categories().iter().filter_map(|c| c.weight).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn questions_iterate_in_rubric_order() {
        let rubric = Rubric::by_name("oppstart1").unwrap();
        let flat: Vec<_> = rubric.questions().collect();
        assert_eq!(flat.len(), rubric.question_count());
        assert_eq!(flat[0].category, "Problemløsning og marked");
        let last = flat.last().unwrap();
        assert_eq!(last.category, "Vedlegg (Nei = 0, Ja = 3)");
    }

    #[test]
    fn verdict_band_edges_are_inclusive() {
        let bands = VerdictBands::STARTUP;
        assert_eq!(bands.classify(2.6), Verdict::Excellent);
        assert_eq!(bands.classify(2.5), Verdict::Excellent);
        assert_eq!(bands.classify(2.49), Verdict::Good);
        assert_eq!(bands.classify(2.0), Verdict::Good);
        assert_eq!(bands.classify(1.5), Verdict::NeedsImprovement);
        assert_eq!(bands.classify(1.4), Verdict::Weak);

        let bands = VerdictBands::CLUSTER;
        assert_eq!(bands.classify(80.0), Verdict::Excellent);
        assert_eq!(bands.classify(65.0), Verdict::Good);
        assert_eq!(bands.classify(50.0), Verdict::NeedsImprovement);
        assert_eq!(bands.classify(49.9), Verdict::Weak);
    }

    #[test]
    fn severity_follows_scale_cut_points() {
        let scale = ScoreScale::STARTUP;
        assert_eq!(scale.severity(2.5), Severity::Strong);
        assert_eq!(scale.severity(1.5), Severity::Moderate);
        assert_eq!(scale.severity(1.49), Severity::Weak);

        let scale = ScoreScale::CLUSTER;
        assert_eq!(scale.severity(3.2), Severity::Strong);
        assert_eq!(scale.severity(2.4), Severity::Moderate);
        assert_eq!(scale.severity(2.39), Severity::Weak);
    }
}
