//! Prompt construction for the scoring model.

use crate::types::listing::ListingForAnalysis;

/// Build the undervaluation-scoring prompt for one listing.
///
/// The model is asked for a 1-5 undervaluation score with a resale profit
/// estimate, answering in the JSON shape the repair parser expects. Images
/// referenced in the manifest are attached to the request separately.
pub fn build_scoring_prompt(listing: &ListingForAnalysis) -> String {
    let image_manifest = if listing.images.is_empty() {
        "No images available".to_string()
    } else {
        listing
            .images
            .iter()
            .enumerate()
            .map(|(i, img)| {
                format!(
                    "- Image {}: {} (attached below)",
                    i + 1,
                    img.description.as_deref().unwrap_or("no description")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are an expert at judging the market value of second-hand goods, particularly bikes and sports equipment.

IMPORTANT: Be CRITICAL and REALISTIC. Assume the buyer can do simple repairs and fixes to increase the value.

Analyze the following listing and rate on a 1-5 scale how undervalued the item may be:

LISTING:
- Title: {title}
- Description: {description}
- Price: {price} {currency}
- Category: {category}
- Condition: {condition}
- Location: {location}
- Seller type: {seller_type}

IMAGES:
{image_manifest}

Examine the attached images carefully: condition and damage, cosmetic versus structural problems, what can be fixed cheaply, photo quality, and how well the seller has cared for the item.

RATING SCALE (critical and realistic):
1 = Heavily overpriced (not worth buying)
2 = Overpriced (hard to make a profit)
3 = Fairly priced (no meaningful margin)
4 = Undervalued (profit potential after simple fixes)
5 = Heavily undervalued (obviously cheap, large margin after fixes)

Ask yourself: can this be fixed cheaply, are the defects cosmetic or structural, what do parts and repairs realistically cost, and is it worth the time at all? Require a clear profit margin after repair costs and a few hours of work before rating 4 or above.

Reply in exactly this format:
{{
  "score": [1-5],
  "reasoning": "Detailed explanation focused on repair costs and profit margin",
  "confidence": [0.0-1.0],
  "factors": ["Factor 1", "Factor 2", "Factor 3"],
  "recommendation": "Practical trading recommendation with repair costs and expected profit",
  "profit_analysis": {{
    "estimated_repair_cost": "Estimated cost of parts and repairs",
    "estimated_repair_time": "Estimated repair time in hours",
    "estimated_sale_price": "Expected sale price after repairs",
    "estimated_profit": "Expected profit after repairs",
    "profit_margin_percent": "Profit margin in percent",
    "risk_level": "Low/Medium/High risk",
    "repair_items": ["What needs fixing", "e.g. new brake pads"],
    "market_comparison": "Comparison with market prices for similar items in good condition"
  }}
}}

BE CRITICAL: not every cheap item is a good deal. Focus on items where simple fixes still leave a clear profit margin."#,
        title = listing.title,
        description = listing.description,
        price = listing.price,
        currency = listing.currency,
        category = listing.category,
        condition = listing.condition.as_deref().unwrap_or("Not specified"),
        location = listing.location,
        seller_type = listing.seller_type,
        image_manifest = image_manifest,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::listing::ImageRef;

    fn listing() -> ListingForAnalysis {
        ListingForAnalysis {
            title: "Trek mountain bike".to_string(),
            description: "Well used, needs new brakes".to_string(),
            price: 1500,
            currency: "kr".to_string(),
            category: "Bikes".to_string(),
            condition: None,
            images: vec![ImageRef::new("https://img.example.com/1.webp")],
            location: "Stockholm".to_string(),
            seller_type: "private".to_string(),
        }
    }

    #[test]
    fn test_prompt_includes_listing_facts() {
        let prompt = build_scoring_prompt(&listing());
        assert!(prompt.contains("Trek mountain bike"));
        assert!(prompt.contains("1500 kr"));
        assert!(prompt.contains("Not specified"));
        assert!(prompt.contains("Image 1"));
    }

    #[test]
    fn test_prompt_without_images() {
        let mut listing = listing();
        listing.images.clear();
        let prompt = build_scoring_prompt(&listing);
        assert!(prompt.contains("No images available"));
    }
}
