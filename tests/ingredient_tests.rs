//! # Ingredient, Allergen and Metadata Tests

#[cfg(test)]
mod tests {
    use label_scan::allergens::AllergenDetector;
    use label_scan::config::Profile;
    use label_scan::ingredients::IngredientExtractor;
    use label_scan::metadata::MetadataExtractor;
    use label_scan::model::Ingredient;

    fn names(ingredients: &[Ingredient]) -> Vec<String> {
        ingredients.iter().map(|i| i.normalized_name.clone()).collect()
    }

    #[test]
    fn test_truncation_before_nutrition_section() {
        let extractor = IngredientExtractor::new().unwrap();
        let ingredients =
            extractor.extract("Ingredients: Sugar, Salt, Oil. Nutrition Facts: Energy 100kcal");

        assert_eq!(names(&ingredients), vec!["Sugar", "Salt", "Oil"]);
    }

    #[test]
    fn test_normalization_idempotent_for_salt() {
        let extractor = IngredientExtractor::new().unwrap();
        let once = extractor.normalize("lodised salt");
        let twice = extractor.normalize(&once);

        assert_eq!(once, "iodised salt");
        assert_eq!(twice, "iodised salt");
    }

    #[test]
    fn test_misread_ingredients_are_corrected() {
        let extractor = IngredientExtractor::new().unwrap();
        let ingredients =
            extractor.extract("Ingredients: Rice Flour, Vegetanle Oill, Lodized Salt, Spices");

        assert_eq!(
            names(&ingredients),
            vec!["Rice Flour", "Vegetable Oil", "Iodised Salt", "Spices"]
        );
        assert_eq!(ingredients[1].raw_token, "vegetanle oill");
    }

    #[test]
    fn test_ingredient_list_stops_at_web_address() {
        let extractor = IngredientExtractor::new().unwrap();
        let ingredients = extractor.extract("Ingredient - Dates, Almonds www.example.com");

        assert_eq!(names(&ingredients), vec!["Dates", "Almonds"]);
    }

    #[test]
    fn test_allergen_dedup_in_vocabulary_order() {
        let detector = AllergenDetector::new(Profile::Lenient).unwrap();
        let allergens = detector.detect("Contains milk and Milk again, wheat");

        assert_eq!(allergens.to_vec(), vec!["milk", "wheat"]);
    }

    #[test]
    fn test_allergen_plural_forms() {
        let detector = AllergenDetector::new(Profile::Lenient).unwrap();
        let allergens = detector.detect("May contain peanuts, tree nuts and sesame seeds");

        assert_eq!(allergens.to_vec(), vec!["peanut", "tree nut", "sesame"]);
    }

    #[test]
    fn test_strict_allergen_scan_ignores_ingredient_list() {
        let detector = AllergenDetector::new(Profile::Strict).unwrap();
        let text = "Ingredients: Wheat Flour, Soy Lecithin\nContains: Wheat, Soy";

        assert_eq!(detector.detect(text).to_vec(), vec!["soy", "wheat"]);
        assert!(detector.detect("Ingredients: Wheat Flour").is_empty());
    }

    #[test]
    fn test_metadata_fields() {
        let extractor = MetadataExtractor::new().unwrap();
        let text = "Nutrition Information per 100g\n\
                    Packed by: Sunrise Foods Pvt Ltd, 14 Industrial Area\n\
                    Best Before: 9 months from manufacture\n\
                    Country of Origin: India\n\
                    FSSAI Lic No. 10012022000456";
        let metadata = extractor.extract(text);

        assert_eq!(metadata.serving_size.as_deref(), Some("per 100 g"));
        assert_eq!(metadata.manufacturer.as_deref(), Some("Sunrise Foods Pvt Ltd"));
        assert_eq!(metadata.best_before.as_deref(), Some("9 months from manufacture"));
        assert_eq!(metadata.country.as_deref(), Some("India"));
        assert!(metadata.license.valid);
        assert_eq!(metadata.license.number.as_deref(), Some("10012022000456"));
        assert_eq!(metadata.license.status, "FSSAI license detected");
    }

    #[test]
    fn test_bare_manufacturer_line() {
        let extractor = MetadataExtractor::new().unwrap();
        let text = "Net Wt 200 g\nGolden Harvest Foods Ltd, 22 Mill Road\nMRP 45";

        assert_eq!(
            extractor.manufacturer(text).as_deref(),
            Some("Golden Harvest Foods Ltd")
        );
    }

    #[test]
    fn test_metadata_absent_fields() {
        let extractor = MetadataExtractor::new().unwrap();
        let metadata = extractor.extract("Energy 100 kcal");

        assert!(metadata.serving_size.is_none());
        assert!(metadata.manufacturer.is_none());
        assert!(metadata.best_before.is_none());
        assert!(metadata.country.is_none());
        assert!(!metadata.license.valid);
        assert_eq!(metadata.license.status, "Not Found");
    }
}
