// src/proximity/cascade.rs
//! Fallback cascade used when live geolocation is unavailable.
//!
//! Tiers are an ordered table of (hint, field) predicates. The first tier that
//! matches at least one manufacturer wins; the `Default` tier is handled by the
//! matcher since it needs distances.

use crate::proximity::types::{FallbackLocation, FallbackTier, ManufacturerRecord};

struct TierMatcher {
    tier: FallbackTier,
    hint: fn(&FallbackLocation) -> Option<&str>,
    field: fn(&ManufacturerRecord) -> &str,
}

fn city_hint(f: &FallbackLocation) -> Option<&str> {
    f.city.as_deref()
}
fn district_hint(f: &FallbackLocation) -> Option<&str> {
    f.district.as_deref()
}
fn state_hint(f: &FallbackLocation) -> Option<&str> {
    f.state.as_deref()
}
fn city_of(m: &ManufacturerRecord) -> &str {
    &m.location.city
}
// District names usually only show up inside the free-form address.
fn address_of(m: &ManufacturerRecord) -> &str {
    &m.location.address
}
fn state_of(m: &ManufacturerRecord) -> &str {
    &m.location.state
}

const TIERS: [TierMatcher; 3] = [
    TierMatcher {
        tier: FallbackTier::City,
        hint: city_hint,
        field: city_of,
    },
    TierMatcher {
        tier: FallbackTier::District,
        hint: district_hint,
        field: address_of,
    },
    TierMatcher {
        tier: FallbackTier::State,
        hint: state_hint,
        field: state_of,
    },
];

/// Case-insensitive containment in either direction. Blank values never match.
pub fn loosely_matches(value: &str, hint: &str) -> bool {
    let v = value.trim().to_lowercase();
    let h = hint.trim().to_lowercase();
    if v.is_empty() || h.is_empty() {
        return false;
    }
    v.contains(&h) || h.contains(&v)
}

/// Try the locality tiers in order. Returns the matching subset (store order
/// preserved, no distances) and the tier that produced it, or `None` if every
/// tier came up empty or had no hint.
pub fn match_locality(
    manufacturers: &[ManufacturerRecord],
    hints: &FallbackLocation,
) -> Option<(Vec<ManufacturerRecord>, FallbackTier)> {
    for t in TIERS.iter() {
        let Some(hint) = (t.hint)(hints) else {
            continue;
        };
        if hint.trim().is_empty() {
            continue;
        }
        let hits: Vec<ManufacturerRecord> = manufacturers
            .iter()
            .filter(|m| loosely_matches((t.field)(m), hint))
            .map(|m| ManufacturerRecord {
                distance_km: None,
                ..m.clone()
            })
            .collect();
        if !hits.is_empty() {
            tracing::debug!(
                target: "proximity",
                tier = t.tier.as_str(),
                hits = hits.len(),
                "locality fallback matched"
            );
            return Some((hits, t.tier));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proximity::types::Location;

    fn kiln(id: &str, city: &str, address: &str, state: &str) -> ManufacturerRecord {
        ManufacturerRecord {
            id: id.into(),
            name: format!("Kiln {id}"),
            products: vec![],
            location: Location {
                latitude: 0.0,
                longitude: 0.0,
                address: address.into(),
                city: city.into(),
                state: state.into(),
            },
            distance_km: None,
            status: None,
            is_test_entry: false,
        }
    }

    #[test]
    fn containment_works_both_ways() {
        assert!(loosely_matches("New Delhi", "delhi"));
        assert!(loosely_matches("Delhi", "New Delhi NCR"));
        assert!(!loosely_matches("Mumbai", "Delhi"));
        assert!(!loosely_matches("", "Delhi"));
        assert!(!loosely_matches("Delhi", "   "));
    }

    #[test]
    fn city_beats_district_and_state() {
        let all = vec![
            kiln("1", "Jaipur", "Sanganer, Jaipur district", "Rajasthan"),
            kiln("2", "Ajmer", "Kishangarh", "Rajasthan"),
        ];
        let hints = FallbackLocation {
            city: Some("jaipur".into()),
            district: Some("Kishangarh".into()),
            state: Some("Rajasthan".into()),
        };
        let (hits, tier) = match_locality(&all, &hints).unwrap();
        assert_eq!(tier, FallbackTier::City);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn falls_through_to_district_then_state() {
        let all = vec![
            kiln("1", "Jaipur", "Sanganer", "Rajasthan"),
            kiln("2", "Ajmer", "Kishangarh", "Rajasthan"),
        ];
        let district = FallbackLocation {
            city: Some("Udaipur".into()),
            district: Some("kishangarh".into()),
            state: None,
        };
        let (hits, tier) = match_locality(&all, &district).unwrap();
        assert_eq!(tier, FallbackTier::District);
        assert_eq!(hits[0].id, "2");

        let state = FallbackLocation {
            city: Some("Udaipur".into()),
            district: None,
            state: Some("RAJASTHAN".into()),
        };
        let (hits, tier) = match_locality(&all, &state).unwrap();
        assert_eq!(tier, FallbackTier::State);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn tier_hits_carry_no_distance() {
        let mut ranked = kiln("1", "Mumbai", "Andheri", "Maharashtra");
        ranked.distance_km = Some(13.37);
        let hints = FallbackLocation {
            city: Some("Mumbai".into()),
            ..Default::default()
        };
        let (hits, _) = match_locality(&[ranked], &hints).unwrap();
        assert_eq!(hits[0].distance_km, None);
    }

    #[test]
    fn no_hints_means_no_locality_match() {
        let all = vec![kiln("1", "Jaipur", "", "Rajasthan")];
        assert!(match_locality(&all, &FallbackLocation::default()).is_none());
    }
}
