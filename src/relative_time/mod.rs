//! Localized "time ago" formatting for the catalog's last-updated summary.

use chrono::{DateTime, Utc};

/// Per-locale wording.
struct Phrases {
    last_updated: &'static str,
    just_now: &'static str,
    before: &'static str,
    after: &'static str,
    /// (singular, plural) for minute, hour, day, month, year
    units: [(&'static str, &'static str); 5],
}

const EN: Phrases = Phrases {
    last_updated: "Last updated",
    just_now: "just now",
    before: "",
    after: " ago",
    units: [
        ("minute", "minutes"),
        ("hour", "hours"),
        ("day", "days"),
        ("month", "months"),
        ("year", "years"),
    ],
};

const FR: Phrases = Phrases {
    last_updated: "Dernière mise à jour",
    just_now: "à l'instant",
    before: "il y a ",
    after: "",
    units: [
        ("minute", "minutes"),
        ("heure", "heures"),
        ("jour", "jours"),
        ("mois", "mois"),
        ("an", "ans"),
    ],
};

const ES: Phrases = Phrases {
    last_updated: "Última actualización",
    just_now: "justo ahora",
    before: "hace ",
    after: "",
    units: [
        ("minuto", "minutos"),
        ("hora", "horas"),
        ("día", "días"),
        ("mes", "meses"),
        ("año", "años"),
    ],
};

const DE: Phrases = Phrases {
    last_updated: "Zuletzt aktualisiert",
    just_now: "gerade eben",
    before: "vor ",
    after: "",
    units: [
        ("Minute", "Minuten"),
        ("Stunde", "Stunden"),
        ("Tag", "Tagen"),
        ("Monat", "Monaten"),
        ("Jahr", "Jahren"),
    ],
};

/// Unknown locales fall back to English. Region subtags are ignored.
fn phrases(locale: &str) -> &'static Phrases {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match language.as_str() {
        "fr" => &FR,
        "es" => &ES,
        "de" => &DE,
        _ => &EN,
    }
}

/// Time elapsed between `then` and `now`, e.g. "3 hours ago".
///
/// Timestamps in the future read as "just now".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>, locale: &str) -> String {
    let phrases = phrases(locale);
    let seconds = (now - then).num_seconds();

    let (count, unit) = match seconds {
        s if s < 60 => return phrases.just_now.to_string(),
        s if s < 3_600 => (s / 60, 0),
        s if s < 86_400 => (s / 3_600, 1),
        s if s < 30 * 86_400 => (s / 86_400, 2),
        s if s < 365 * 86_400 => (s / (30 * 86_400), 3),
        s => (s / (365 * 86_400), 4),
    };

    let (singular, plural) = phrases.units[unit];
    let word = if count == 1 { singular } else { plural };

    format!("{}{} {}{}", phrases.before, count, word, phrases.after)
}

/// Full summary line, e.g. "Last updated 2 days ago".
pub fn last_updated_text(then: DateTime<Utc>, now: DateTime<Utc>, locale: &str) -> String {
    format!(
        "{} {}",
        phrases(locale).last_updated,
        time_ago(then, now, locale)
    )
}
