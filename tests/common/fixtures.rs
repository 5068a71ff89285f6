//! Static export corpora used across harnesses.

/// The canonical three-ticket GLPI export (semicolon, day-first dates).
pub const EXPORT_GLPI: &str = "\
Fecha de apertura;Estados;Prioridad;Asignado a - Técnico;Categoría;ID
01-03-2024 10:00;Nuevo;Alta;Ana;Redes;1
15-03-2024 11:00;Pendiente;Media;Luis;Software;2
02-04-2024 09:00;Resuelto;Alta;Ana;Redes;3
";

/// Same tickets, comma-separated, English headers, ISO dates, no id column.
pub const EXPORT_COMMA_NO_ID: &str = "\
Date,Status,Priority,Technician,Category
2024-03-01 10:00,Nuevo,Alta,Ana,Redes
2024-03-15 11:00,Pendiente,Media,Luis,Software
2024-04-02 09:00,Resuelto,Alta,Ana,Redes
";

/// A row whose date no strategy can read.
pub const EXPORT_BAD_DATE: &str = "\
ID;Fecha;Estado;Técnico
1;not-a-date;Nuevo;Ana
2;05-01-2024 08:30;Cerrado;Ana
";

/// Header row only.
pub const EXPORT_HEADER_ONLY: &str = "ID;Estado;Prioridad\n";

/// Latin-1 encoded export: `Categoría` and `Técnico` carry single-byte accents.
pub fn export_latin1() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"ID;Categor\xeda;T\xe9cnico;Estado\n");
    bytes.extend_from_slice(b"1;Impresi\xf3n;Jos\xe9;Nuevo\n");
    bytes.extend_from_slice(b"2;Redes;Mar\xeda;Resuelto\n");
    bytes
}

/// `n` synthetic rows spread across technicians, statuses and months of 2024.
pub fn export_generated(n: usize) -> String {
    const STATUSES: &[&str] = &["Nuevo", "Pendiente", "Resuelto", "Cerrado"];
    const TECHS: &[&str] = &["Ana", "Luis", "Marta", "José", "Pedro"];
    let mut out =
        String::from("ID;Fecha de apertura;Estados;Prioridad;Asignado a - Técnico;Categoría\n");
    for i in 0..n {
        out.push_str(&format!(
            "{id};{day:02}-{month:02}-2024 10:00;{status};{prio};{tech};Cat{cat}\n",
            id = i + 1,
            day = i % 28 + 1,
            month = i % 12 + 1,
            status = STATUSES[i % STATUSES.len()],
            prio = if i % 3 == 0 { "Alta" } else { "Media" },
            tech = TECHS[i % TECHS.len()],
            cat = i % 4,
        ));
    }
    out
}
