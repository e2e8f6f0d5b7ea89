// src/gazetteer.rs

//! Static city gazetteer.
//!
//! Maps free-text city input to a canonical display name and coordinates.
//! Aliases cover the native-script full name, common abbreviations and the
//! Latin-script equivalent. Lookups that miss keep the user's input verbatim
//! (title-cased) with no coordinates.

use std::collections::HashMap;
use std::sync::LazyLock;

pub struct CityEntry {
    pub canonical: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub aliases: &'static [&'static str],
}

static CITIES: &[CityEntry] = &[
    CityEntry {
        canonical: "Москва",
        lat: 55.7558,
        lon: 37.6176,
        aliases: &["москва", "мск", "moscow", "moskva"],
    },
    CityEntry {
        canonical: "Санкт-Петербург",
        lat: 59.9343,
        lon: 30.3351,
        aliases: &[
            "санкт-петербург",
            "санкт петербург",
            "спб",
            "питер",
            "петербург",
            "saint petersburg",
            "st petersburg",
            "spb",
        ],
    },
    CityEntry {
        canonical: "Новосибирск",
        lat: 55.0084,
        lon: 82.9357,
        aliases: &["новосибирск", "нск", "novosibirsk"],
    },
    CityEntry {
        canonical: "Екатеринбург",
        lat: 56.8389,
        lon: 60.6057,
        aliases: &["екатеринбург", "екб", "ekaterinburg", "yekaterinburg"],
    },
    CityEntry {
        canonical: "Казань",
        lat: 55.7963,
        lon: 49.1088,
        aliases: &["казань", "kazan"],
    },
    CityEntry {
        canonical: "Нижний Новгород",
        lat: 56.2965,
        lon: 43.9361,
        aliases: &["нижний новгород", "нижний", "нн", "nizhny novgorod"],
    },
    CityEntry {
        canonical: "Челябинск",
        lat: 55.1644,
        lon: 61.4368,
        aliases: &["челябинск", "челяба", "chelyabinsk"],
    },
    CityEntry {
        canonical: "Самара",
        lat: 53.1959,
        lon: 50.1001,
        aliases: &["самара", "samara"],
    },
    CityEntry {
        canonical: "Омск",
        lat: 54.9885,
        lon: 73.3242,
        aliases: &["омск", "omsk"],
    },
    CityEntry {
        canonical: "Ростов-на-Дону",
        lat: 47.2357,
        lon: 39.7015,
        aliases: &["ростов-на-дону", "ростов на дону", "ростов", "rostov-on-don", "rostov"],
    },
    CityEntry {
        canonical: "Уфа",
        lat: 54.7388,
        lon: 55.9721,
        aliases: &["уфа", "ufa"],
    },
    CityEntry {
        canonical: "Красноярск",
        lat: 56.0153,
        lon: 92.8932,
        aliases: &["красноярск", "krasnoyarsk"],
    },
    CityEntry {
        canonical: "Воронеж",
        lat: 51.6608,
        lon: 39.2003,
        aliases: &["воронеж", "voronezh"],
    },
    CityEntry {
        canonical: "Пермь",
        lat: 58.0105,
        lon: 56.2502,
        aliases: &["пермь", "perm"],
    },
    CityEntry {
        canonical: "Волгоград",
        lat: 48.7080,
        lon: 44.5133,
        aliases: &["волгоград", "volgograd"],
    },
    CityEntry {
        canonical: "Краснодар",
        lat: 45.0355,
        lon: 38.9753,
        aliases: &["краснодар", "krasnodar"],
    },
    CityEntry {
        canonical: "Сочи",
        lat: 43.6028,
        lon: 39.7342,
        aliases: &["сочи", "sochi"],
    },
    CityEntry {
        canonical: "Калининград",
        lat: 54.7104,
        lon: 20.4522,
        aliases: &["калининград", "кениг", "kaliningrad"],
    },
    CityEntry {
        canonical: "Владивосток",
        lat: 43.1155,
        lon: 131.8855,
        aliases: &["владивосток", "владик", "vladivostok"],
    },
    CityEntry {
        canonical: "Минск",
        lat: 53.9006,
        lon: 27.5590,
        aliases: &["минск", "minsk"],
    },
    CityEntry {
        canonical: "Киев",
        lat: 50.4501,
        lon: 30.5234,
        aliases: &["киев", "київ", "kyiv", "kiev"],
    },
    CityEntry {
        canonical: "Алматы",
        lat: 43.2220,
        lon: 76.8512,
        aliases: &["алматы", "алма-ата", "almaty"],
    },
    CityEntry {
        canonical: "Ташкент",
        lat: 41.2995,
        lon: 69.2401,
        aliases: &["ташкент", "tashkent"],
    },
    CityEntry {
        canonical: "Тбилиси",
        lat: 41.7151,
        lon: 44.8271,
        aliases: &["тбилиси", "tbilisi"],
    },
    CityEntry {
        canonical: "Ереван",
        lat: 40.1792,
        lon: 44.4991,
        aliases: &["ереван", "yerevan"],
    },
];

/// Alias table keyed by folded alias text. Canonical names fold to
/// themselves so `coordinates(normalize(x))` resolves for every alias.
static ALIAS_INDEX: LazyLock<HashMap<String, &'static CityEntry>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for entry in CITIES {
        index.insert(fold(entry.canonical), entry);
        for alias in entry.aliases {
            index.insert(fold(alias), entry);
        }
    }
    index
});

/// Folds input for matching: lowercase, trimmed, punctuation collapsed,
/// diacritic-tolerant (ё → е, й → и).
fn fold(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = true;
    for c in raw.trim().chars() {
        let c = match c {
            'ё' | 'Ё' => 'е',
            'й' | 'Й' => 'и',
            '-' | '.' | ',' | '\'' => ' ',
            c => c,
        };
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            for lc in c.to_lowercase() {
                out.push(lc);
            }
            last_was_space = false;
        }
    }
    out.trim_end().to_string()
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>()
                        + &chars.flat_map(|c| c.to_lowercase()).collect::<String>()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn lookup(raw: &str) -> Option<&'static CityEntry> {
    ALIAS_INDEX.get(&fold(raw)).copied()
}

/// Canonical display name for the input, or the trimmed title-cased input
/// when the gazetteer misses.
pub fn normalize(raw: &str) -> String {
    match lookup(raw) {
        Some(entry) => entry.canonical.to_string(),
        None => title_case(raw),
    }
}

/// Gazetteer coordinates for the input, or `None` on a miss.
pub fn coordinates(raw: &str) -> Option<(f64, f64)> {
    lookup(raw).map(|entry| (entry.lat, entry.lon))
}

/// Closest gazetteer city to a geolocation, within 100 km.
pub fn nearest(lat: f64, lon: f64) -> Option<&'static CityEntry> {
    CITIES
        .iter()
        .map(|entry| {
            (
                crate::distance::haversine_km((lat, lon), (entry.lat, entry.lon)),
                entry,
            )
        })
        .filter(|(d, _)| *d <= 100.0)
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, entry)| entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical() {
        for raw in ["москва", "мск", "MOSCOW", " Москва "] {
            assert_eq!(normalize(raw), "Москва");
            assert_eq!(coordinates(raw), Some((55.7558, 37.6176)));
        }
        assert_eq!(normalize("спб"), "Санкт-Петербург");
        assert_eq!(normalize("Питер"), "Санкт-Петербург");
    }

    #[test]
    fn miss_preserves_input_title_cased() {
        assert_eq!(normalize("  урюпинск  "), "Урюпинск");
        assert_eq!(coordinates("урюпинск"), None);
    }

    #[test]
    fn normalize_round_trips_through_coordinates() {
        for entry in super::CITIES {
            for alias in entry.aliases {
                assert_eq!(
                    coordinates(&normalize(alias)),
                    coordinates(alias),
                    "alias {}",
                    alias
                );
            }
        }
    }

    #[test]
    fn nearest_snaps_to_the_closest_city() {
        // A point inside Moscow.
        let entry = nearest(55.70, 37.50).unwrap();
        assert_eq!(entry.canonical, "Москва");
        // The middle of the Barents Sea is near nothing.
        assert!(nearest(75.0, 40.0).is_none());
    }

    #[test]
    fn fold_is_diacritic_tolerant() {
        assert_eq!(fold("Орёл"), fold("орел"));
        assert_eq!(fold("Санкт-Петербург"), fold("санкт петербург"));
    }
}
