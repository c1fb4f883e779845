//! Read-path queries over a catalog snapshot.
//!
//! Handlers and tools clone an `Arc<Catalog>` out of the handle and call
//! these methods on it; nothing here takes a lock or mutates the maps.

use std::collections::HashSet;

use tracing::debug;
use tyreplex_config::constants::catalog as consts;
use tyreplex_core::{
    normalize_size, BrandComparison, BrandQuote, BudgetBand, PriceBandListing, RecommendationSet,
    TyreOffer, TyreQuote, VehicleFitment, VehicleMatch,
};

use crate::store::Catalog;
use crate::CatalogError;

impl Catalog {
    /// Resolves a vehicle to its factory tyre sizes. Matching is
    /// case-insensitive; when several records share the key, the first
    /// imported one answers.
    pub fn vehicle_tyre_size(
        &self,
        make: &str,
        model: &str,
        variant: &str,
    ) -> Result<VehicleFitment, CatalogError> {
        let record = self.first_vehicle(make, model, variant).ok_or_else(|| {
            CatalogError::VehicleNotFound(format!(
                "{} {} {}",
                make.trim(),
                model.trim(),
                variant.trim()
            ))
        })?;
        Ok(VehicleFitment {
            make: record.make.clone(),
            model: record.model.clone(),
            variant: record.variant.clone(),
            vehicle_type: record.vehicle_type.clone(),
            fuel_type: record.fuel_type.clone(),
            front_tyre_size: record.front_tyre_size.clone(),
            rear_tyre_size: record.rear_tyre_size.clone(),
            same_size: record.same_size(),
        })
    }

    /// Offers in a size, deduplicated, price-sorted and cut to a budget
    /// band. The size is matched exactly first, then by its normalized
    /// form, so `"185/65 R15"`, `"185/65R15"` and `"185-65-15"` all hit
    /// the same listing. Unknown sizes yield an empty list.
    pub fn tyres_by_size(&self, size: &str, band: BudgetBand) -> Vec<TyreOffer> {
        let size = size.trim();
        let mut found = self.offers_for_size(size);
        if found.is_empty() {
            let wanted = normalize_size(size);
            if let Some((key, offers)) = self
                .tyre_database
                .iter()
                .filter(|(key, _)| normalize_size(key) == wanted)
                .min_by(|a, b| a.0.cmp(b.0))
            {
                debug!(requested = size, matched = key.as_str(), "size matched via normalization");
                found = offers;
            }
        }

        // Same product listed for several vehicles collapses to its first
        // occurrence, then a stable sort ranks by price.
        let mut seen = HashSet::new();
        let mut unique: Vec<TyreOffer> = Vec::with_capacity(found.len());
        for offer in found {
            if seen.insert(offer.dedup_key()) {
                unique.push(offer.clone());
            }
        }
        unique.sort_by(|a, b| a.price.total_cmp(&b.price));
        apply_band(unique, band)
    }

    /// Top quotes for a size and band. `total_options` counts the whole
    /// band, not just the quoted head of it.
    pub fn recommendations(
        &self,
        size: &str,
        band: BudgetBand,
    ) -> Result<RecommendationSet, CatalogError> {
        let offers = self.tyres_by_size(size, band);
        if offers.is_empty() {
            return Err(CatalogError::SizeNotFound(size.trim().to_string()));
        }
        let recommendations = offers
            .iter()
            .take(consts::MAX_RECOMMENDATIONS)
            .map(TyreQuote::from_offer)
            .collect();
        Ok(RecommendationSet {
            tyre_size: size.trim().to_string(),
            budget_range: band,
            total_options: offers.len(),
            recommendations,
        })
    }

    /// Case-insensitive substring search over vehicle keys, in sorted key
    /// order, capped at `MAX_SEARCH_RESULTS`. Matches come back as
    /// structured make/model/variant in the stored casing.
    pub fn search_vehicles(&self, query: &str) -> Vec<VehicleMatch> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut matches = Vec::new();
        for (key, records) in self.vehicle_entries() {
            if !key.contains(&needle) {
                continue;
            }
            if let Some(record) = records.first() {
                matches.push(VehicleMatch {
                    make: record.make.clone(),
                    model: record.model.clone(),
                    variant: record.variant.clone(),
                });
            }
            if matches.len() >= consts::MAX_SEARCH_RESULTS {
                break;
            }
        }
        matches
    }

    /// Cheapest offer of each brand in a size, side by side. The reported
    /// quote carries the catalog's casing; `cheaper_brand` echoes whichever
    /// input argument won, with ties going to `brand_b`.
    pub fn compare_brands(
        &self,
        size: &str,
        brand_a: &str,
        brand_b: &str,
    ) -> Result<BrandComparison, CatalogError> {
        let offers = self.tyres_by_size(size, BudgetBand::All);
        let (best_a, best_b) = match (cheapest(&offers, brand_a), cheapest(&offers, brand_b)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(CatalogError::BrandsNotFound(size.trim().to_string())),
        };
        let cheaper = if best_a.price < best_b.price {
            brand_a
        } else {
            brand_b
        };
        Ok(BrandComparison {
            tyre_size: size.trim().to_string(),
            brand1: BrandQuote {
                name: best_a.brand.clone(),
                model: best_a.model.clone(),
                price: best_a.price as i64,
                mrp: best_a.mrp as i64,
            },
            brand2: BrandQuote {
                name: best_b.brand.clone(),
                model: best_b.model.clone(),
                price: best_b.price as i64,
                mrp: best_b.mrp as i64,
            },
            price_difference: (best_a.price - best_b.price).abs(),
            cheaper_brand: cheaper.trim().to_string(),
        })
    }

    /// Offers within an inclusive price window, cheapest first, quoting at
    /// most `MAX_PRICE_RANGE_RESULTS` of them.
    pub fn price_range(
        &self,
        size: &str,
        min: i64,
        max: i64,
    ) -> Result<PriceBandListing, CatalogError> {
        let offers = self.tyres_by_size(size, BudgetBand::All);
        let in_range: Vec<&TyreOffer> = offers
            .iter()
            .filter(|offer| offer.price >= min as f64 && offer.price <= max as f64)
            .collect();
        if in_range.is_empty() {
            return Err(CatalogError::PriceRangeEmpty {
                size: size.trim().to_string(),
                min,
                max,
            });
        }
        let recommendations = in_range
            .iter()
            .take(consts::MAX_PRICE_RANGE_RESULTS)
            .map(|offer| TyreQuote::from_offer(offer))
            .collect();
        Ok(PriceBandListing {
            tyre_size: size.trim().to_string(),
            min_price: min,
            max_price: max,
            total_options: in_range.len(),
            recommendations,
        })
    }
}

/// Positional budget bucketing over a price-sorted listing.
///
/// `budget` is the cheapest 30% but never fewer than 3 items, `premium`
/// the priciest 30%, `mid` the window between them. The mid window only
/// collapses for listings of 0 or 1 items, where the first-5 fallback
/// applies.
fn apply_band(offers: Vec<TyreOffer>, band: BudgetBand) -> Vec<TyreOffer> {
    let n = offers.len();
    match band {
        BudgetBand::All => offers,
        BudgetBand::Budget => {
            let take = consts::MIN_BUDGET_ITEMS.max((n as f64 * consts::BUDGET_FRACTION) as usize);
            offers.into_iter().take(take).collect()
        }
        BudgetBand::Premium => {
            let start = (n as f64 * consts::PREMIUM_FRACTION) as usize;
            offers.into_iter().skip(start).collect()
        }
        BudgetBand::Mid => {
            let start = (n as f64 * consts::BUDGET_FRACTION) as usize;
            let end = (n as f64 * consts::PREMIUM_FRACTION) as usize;
            if start < end {
                offers[start..end].to_vec()
            } else {
                offers.into_iter().take(consts::MID_FALLBACK_ITEMS).collect()
            }
        }
    }
}

fn cheapest<'a>(offers: &'a [TyreOffer], brand: &str) -> Option<&'a TyreOffer> {
    let brand = brand.trim().to_lowercase();
    offers
        .iter()
        .filter(|offer| offer.brand.to_lowercase() == brand)
        .min_by(|a, b| a.price.total_cmp(&b.price))
}
