//! Header canonicalizer: maps loosely-spelled export headers onto
//! [`CanonicalField`]s.
//!
//! Raw headers are first folded into a canonical form (accents stripped,
//! lowercase, punctuation and whitespace collapsed to `_`), then matched
//! against [`ALIASES`]. Resolution is deterministic: alias priority first,
//! column position second.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::types::{CanonicalField, ResolvedColumn};

// ---------------------------------------------------------------------------
// Alias table
// ---------------------------------------------------------------------------

/// Accepted header spellings per field, in canonical form, highest priority first.
pub const ALIASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::Id,
        &["id", "ticket_id", "id_ticket", "numero_de_ticket", "numero", "n_ticket"],
    ),
    (
        CanonicalField::Date,
        &[
            "fecha_de_apertura",
            "fecha_apertura",
            "fecha_de_creacion",
            "fecha_creacion",
            "fecha",
            "opening_date",
            "created_at",
            "date",
        ],
    ),
    (
        CanonicalField::Status,
        &["estados", "estado", "status", "state"],
    ),
    (
        CanonicalField::Priority,
        &["prioridad", "priority", "urgencia"],
    ),
    (
        CanonicalField::Technician,
        &[
            "asignado_a_tecnico",
            "tecnico_asignado",
            "tecnico",
            "asignado_a",
            "assigned_to_technician",
            "assigned_to",
            "technician",
        ],
    ),
    (
        CanonicalField::Category,
        &["categoria", "category"],
    ),
];

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-/.()]").expect("punctuation pattern must compile"));

/// Fold a raw header into its canonical form.
///
/// `"  Asignado a - Técnico "` becomes `"asignado_a_tecnico"`. Applying it to
/// its own output is a no-op.
pub fn canonicalize(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let spaced = PUNCTUATION.replace_all(folded.trim(), " ");
    spaced.split_whitespace().collect::<Vec<_>>().join("_")
}

// ---------------------------------------------------------------------------
// Field map
// ---------------------------------------------------------------------------

/// A raw column selected for a canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedColumn {
    /// Position in the raw header row.
    pub index: usize,
    /// Header text exactly as it appeared in the file.
    pub header: String,
}

/// Result of resolving a header row: at most one raw column per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    columns: [Option<MappedColumn>; 6],
}

impl FieldMap {
    /// Resolve a header row against [`ALIASES`]. Never fails; unmatched
    /// fields are simply absent from the map.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let canonical: Vec<String> = headers.iter().map(|h| canonicalize(h.as_ref())).collect();
        let mut claimed = vec![false; headers.len()];
        let mut map = FieldMap::default();

        for (field, aliases) in ALIASES {
            let hit = aliases.iter().find_map(|alias| {
                canonical
                    .iter()
                    .enumerate()
                    .find(|(i, c)| !claimed[*i] && c.as_str() == *alias)
                    .map(|(i, _)| i)
            });

            match hit {
                Some(index) => {
                    claimed[index] = true;
                    let header = headers[index].as_ref().to_string();
                    debug!(%field, column = index, header = %header, "resolved header");
                    map.columns[field.index()] = Some(MappedColumn { index, header });
                }
                None => debug!(%field, "no header matched"),
            }
        }

        map
    }

    pub fn get(&self, field: CanonicalField) -> Option<&MappedColumn> {
        self.columns[field.index()].as_ref()
    }

    /// True when no id column was found and ids must be generated.
    pub fn synthesizes_id(&self) -> bool {
        self.get(CanonicalField::Id).is_none()
    }

    pub fn resolved_columns(&self) -> Vec<ResolvedColumn> {
        CanonicalField::ALL
            .iter()
            .map(|&field| ResolvedColumn {
                field,
                header: self.get(field).map(|c| c.header.clone()),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
