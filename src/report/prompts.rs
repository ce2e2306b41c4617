//! Stage prompts
//!
//! System instructions are fixed per stage. Prompt builders only interpolate
//! slot text; an empty slot yields an empty section, never an error.

use crate::types::truncate_chars;

// =============================================================================
// System instructions
// =============================================================================

pub const OUTLINE_SYSTEM: &str = "You plan executive reports written in French.
Given a French request, reply with ONLY a compact JSON object of this shape:
{ \"title\": str, \"sections\": [ { \"h2\": str, \"h3\": [str, ...] }, ... ] }
Rules:
- between 5 and 8 h2 entries;
- between 2 and 4 h3 entries per h2;
- short, informative titles.";

pub const RESEARCH_SYSTEM: &str = "You synthesize research WITHOUT any web access.
Reply with a JSON object in French built from your internal knowledge only:
{ \"key_points\": [str, ...],
  \"figures\": [ { \"name\": str, \"value\": str, \"unit\": str, \"year\": str } ],
  \"assumptions\": [str, ...],
  \"limitations\": [\"Pas d'accès au web; chiffres potentiellement datés\", ...] }
Rules:
- when the conversation contains a DATA block, its numbers take precedence over yours;
- when a value is uncertain, write 'estimation' as the value and add a limitation.";

pub const MATH_SYSTEM: &str = "You are a meticulous calculation agent. The input lists the figures to compute.
Reply with ONLY a JSON object of this shape:
{ \"computations\": [ { \"label\": str, \"formula\": str, \"result\": str } ], \"notes\": [str, ...] }
When a required number is missing, return an empty computations list and a note saying what is missing. Never invent a number.";

pub const CRITIC_SYSTEM: &str = "You review French reports before publication. You receive the outline, the research synthesis and the computations.
Reply with a compact JSON object:
{ \"blocking_issues\": [str, ...], \"warnings\": [str, ...], \"suggested_fixes\": [str, ...] }
Rules:
- flag requested numbers that are missing;
- flag claims that cannot be verified;
- keep fixes short and actionable.";

pub const WRITER_SYSTEM: &str = "You are a senior technical writer producing a COMPLETE French report in Markdown.
Inputs: outline JSON, research JSON, math JSON, critic JSON.
Expected sections:
# Titre du rapport
## Résumé exécutif
## Table des matières
## Données clés (tableau)
## Méthodologie et hypothèses
## Analyse détaillée (structure H2/H3 de l'outline)
## Recommandations
## Limites et points d'attention
## Annexes
Rules:
- the H1 is the title proposed by the outline;
- use the math JSON figures when present, otherwise state clearly that they are missing;
- state that no web search was performed;
- professional, concise, actionable tone.";

// =============================================================================
// Prompt builders
// =============================================================================

pub fn outline_prompt(request: &str) -> String {
    format!(
        "Produis un JSON d'outline DÉTAILLÉ pour un rapport complet.
Format: {{\"title\": str, \"sections\": [{{\"h2\": str, \"h3\": [str,...]}}]}}
Entre 5 et 8 sections H2, 2 à 4 H3 par section, titres courts, en français.
Requête: {request}"
    )
}

pub fn research_prompt(
    data_block: &str,
    outline: &str,
    evidence: Option<&str>,
    critique: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Synthétise les données en JSON détaillé:
{{\"key_points\": [8+ points], \"figures\": [{{\"name\", \"value\", \"unit\", \"year\"}}], \"assumptions\": [...], \"limitations\": [...]}}
Marque toute valeur incertaine comme estimation et liste explicitement les limites.

{data_block}

Outline: {outline}"
    );

    if let Some(evidence) = evidence.filter(|e| !e.trim().is_empty()) {
        prompt.push_str("\n\nRésumés encyclopédiques (à citer comme source secondaire):\n");
        prompt.push_str(evidence);
    }

    if let Some(critique) = critique.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nRévision demandée. Corrige les problèmes bloquants suivants:\n");
        prompt.push_str(critique);
    }

    prompt
}

pub fn math_prompt(computations: &[String], research: &str) -> String {
    let required: String = computations
        .iter()
        .map(|c| format!("- {}\n", c))
        .collect();

    format!(
        "Calcule TOUT. Format JSON:
{{\"computations\": [{{\"label\", \"formula\", \"result\"}}], \"notes\": [...]}}
Si une donnée nécessaire est absente, renvoie une liste de calculs vide et une note expliquant ce qui manque.
Calculs requis:
{required}Data: {research}"
    )
}

pub fn critic_prompt(outline: &str, research: &str, math: &str, preview_chars: usize) -> String {
    format!(
        "Vérifie tout. JSON:
{{\"blocking_issues\": [], \"warnings\": [...], \"suggested_fixes\": [...]}}
Outline: {}
Research: {}
Math: {}",
        truncate_chars(outline, preview_chars),
        truncate_chars(research, preview_chars),
        truncate_chars(math, preview_chars),
    )
}

pub fn writer_prompt(
    request: &str,
    outline: &str,
    research: &str,
    math: &str,
    critique: &str,
) -> String {
    format!(
        r#"MISSION: Rédiger un RAPPORT COMPLET ET DÉTAILLÉ en Markdown à partir des données fournies.

CONTEXTE DE LA REQUÊTE:
{request}

STRUCTURE OBLIGATOIRE (au moins 25 paragraphes au total):

# [Titre repris de l'outline JSON]

## Résumé exécutif
3 à 4 paragraphes: points clés, chiffres principaux si disponibles, conclusions, perspectives.

## Table des matières
Liste numérotée de toutes les sections.

## Données clés
Tableau Markdown de tous les indicateurs disponibles:
| Indicateur | Valeur | Description | Source/Année |
|------------|--------|-------------|--------------|

## Méthodologie et hypothèses
2 à 3 paragraphes: sources, méthodes, hypothèses retenues, période couverte.

## Analyse détaillée
Pour chaque H2 de l'outline, une section ## avec au moins 2 paragraphes substantiels,
et pour chaque H3 une sous-section ### développée avec les chiffres du research et du math JSON.

## Perspectives et projections
2 à 3 paragraphes: évolutions attendues, scénarios, opportunités, risques.

## Recommandations
Au moins 6 recommandations justifiées:
1. **[Recommandation]**: [Justification]

## Limites et points d'attention
2 paragraphes: limites des données, contraintes de méthode, zones d'incertitude.
Intègre ici les remarques du critic.

## Conclusion
2 à 3 paragraphes de synthèse répondant à la question initiale.

## Annexes
### A. Détails techniques (formules et calculs du math JSON)
### B. Sources et références
### C. Données complémentaires

DONNÉES DISPONIBLES:
Outline (structure à suivre): {outline}
Research (données et points clés): {research}
Math (calculs effectués): {math}
Critic (points d'attention): {critique}

EXIGENCES:
- Reprendre le titre de l'outline comme unique H1
- Suivre la structure H2/H3 de l'outline
- Signaler explicitement tout chiffre manquant au lieu de l'inventer
- **Gras** pour les éléments importants, tableaux pour les données structurées
- Ton professionnel et analytique

IMPORTANT: Le rapport doit traiter EXACTEMENT du sujet demandé, pas d'un autre."#
    )
}
