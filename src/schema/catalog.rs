// src/schema/catalog.rs
//! Field lists per document type and version.
//!
//! Adding a column means adding a line here (or a new version when older
//! deployments must keep the previous set).

use super::{Discriminator, FieldDefault, FieldKind, FieldSpec, Schema};
use crate::types::DocumentType;

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Text)
}

const fn year(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::YearText)
}

const fn number(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Number)
}

const fn boolean(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Bool)
}

const fn json_text(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::JsonText)
}

const fn raw(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Raw)
}

const fn object(doc_type: DocumentType, version: u16, fields: &'static [FieldSpec]) -> Schema {
    Schema {
        doc_type,
        version,
        discriminator: Discriminator::Object,
        fields,
    }
}

const PARCEL_IDENTIFIER: FieldSpec =
    text("parcel_identifier").read_from(&["parcel_identifier", "parcel_id"]);

const METADATA_FIELDS: &[FieldSpec] = &[text("label"), raw("relationships")];

const RELATIONSHIP_FIELDS: &[FieldSpec] = &[raw("from"), raw("to")];

const PROPERTY_FIELDS: &[FieldSpec] = &[
    text("property_type"),
    text("build_status"),
    year("property_structure_built_year"),
    year("property_effective_built_year"),
    PARCEL_IDENTIFIER,
    text("area_under_air"),
    text("historic_designation"),
    text("livable_floor_area"),
    number("number_of_units"),
    text("number_of_units_type"),
    text("ownership_estate_type"),
    text("property_legal_description_text"),
    text("property_usage_type"),
    text("request_identifier"),
    text("structure_form"),
    text("subdivision"),
    text("total_area"),
    text("zoning"),
];

const ADDRESS_FIELDS: &[FieldSpec] = &[
    text("county_name"),
    text("request_identifier"),
    text("block"),
    text("city_name"),
    text("country_code"),
    number("latitude"),
    number("longitude"),
    text("lot"),
    text("municipality_name"),
    text("plus_four_postal_code"),
    text("postal_code"),
    text("range"),
    text("route_number"),
    text("section"),
    text("state_code"),
    text("street_direction_prefix").read_from(&["street_pre_directional_text", "street_direction_prefix"]),
    text("street_direction_suffix").read_from(&["street_post_directional_text", "street_direction_suffix"]),
    text("street_name"),
    text("street_number"),
    text("street_suffix").read_from(&["street_suffix_type", "street_suffix"]),
    text("unit_identifier"),
    text("township"),
    text("unnormalized_address").read_from(&["unnormalized_address", "full_address"]),
];

const FACT_SHEET_FIELDS: &[FieldSpec] = &[
    text("ipfs_url").or_default(FieldDefault::EmptyText),
    text("full_generation_command"),
];

const SALES_HISTORY_FIELDS: &[FieldSpec] = &[
    text("ownership_transfer_date"),
    number("purchase_price_amount"),
    text("request_identifier"),
    text("sale_type"),
];

const TAX_FIELDS: &[FieldSpec] = &[
    year("first_year_building_on_tax_roll"),
    year("first_year_on_tax_roll"),
    number("monthly_tax_amount"),
    text("period_end_date"),
    text("period_start_date"),
    raw("property_assessed_value_amount"),
    number("property_building_amount"),
    number("property_land_amount"),
    raw("property_market_value_amount"),
    raw("property_taxable_value_amount"),
    text("request_identifier"),
    number("tax_year"),
    number("yearly_tax_amount"),
];

const STRUCTURE_FIELDS: &[FieldSpec] = &[
    text("roof_date"),
    text("architectural_style_type"),
    text("attachment_type"),
    text("ceiling_condition"),
    text("ceiling_height_average"),
    text("ceiling_insulation_type"),
    text("ceiling_structure_material"),
    text("ceiling_surface_material"),
    text("exterior_door_material"),
    text("exterior_wall_condition"),
    text("exterior_wall_insulation_type"),
    text("exterior_wall_material_primary"),
    text("exterior_wall_material_secondary"),
    text("flooring_condition"),
    text("flooring_material_primary"),
    text("flooring_material_secondary"),
    text("foundation_condition"),
    text("foundation_material"),
    text("foundation_type"),
    text("foundation_waterproofing"),
    text("gutters_condition"),
    text("gutters_material"),
    text("interior_door_material"),
    text("interior_wall_condition"),
    text("interior_wall_finish_primary"),
    text("interior_wall_finish_secondary"),
    text("interior_wall_structure_material"),
    text("interior_wall_surface_material_primary"),
    text("interior_wall_surface_material_secondary"),
    number("number_of_stories"),
    text("primary_framing_material"),
    text("request_identifier"),
    number("roof_age_years"),
    text("roof_condition"),
    text("roof_covering_material"),
    text("roof_design_type"),
    text("roof_material_type"),
    text("roof_structure_material"),
    text("roof_underlayment_type"),
    text("secondary_framing_material"),
    text("structural_damage_indicators"),
    text("subfloor_material"),
    text("window_frame_material"),
    text("window_glazing_type"),
    text("window_operation_type"),
    text("window_screen_material"),
];

const UTILITY_FIELDS: &[FieldSpec] = &[
    text("cooling_system_type"),
    text("electrical_panel_capacity"),
    text("electrical_wiring_type"),
    text("electrical_wiring_type_other_description"),
    text("heating_system_type"),
    text("hvac_condensing_unit_present"),
    text("hvac_unit_condition"),
    text("hvac_unit_issues"),
    text("plumbing_system_type"),
    text("plumbing_system_type_other_description"),
    text("public_utility_type"),
    text("request_identifier"),
    text("sewer_type"),
    text("smart_home_features"),
    text("smart_home_features_other_description"),
    boolean("solar_inverter_visible"),
    boolean("solar_panel_present"),
    text("solar_panel_type"),
    text("solar_panel_type_other_description"),
    text("water_source_type"),
];

const LAYOUT_V1_FIELDS: &[FieldSpec] = &[
    text("cabinet_style"),
    text("clutter_level"),
    text("condition_issues"),
    text("countertop_material"),
    text("decor_elements"),
    text("design_style"),
    text("fixture_finish_quality"),
    text("floor_level"),
    text("flooring_material_type"),
    text("flooring_wear"),
    text("furnished"),
    boolean("has_windows"),
    boolean("is_exterior").or_default(FieldDefault::False),
    boolean("is_finished").or_default(FieldDefault::False),
    text("lighting_features"),
    text("natural_light_quality"),
    text("paint_condition"),
    text("pool_condition"),
    text("pool_equipment"),
    text("pool_surface_type"),
    text("pool_type"),
    text("pool_water_quality"),
    text("request_identifier"),
    text("safety_features"),
    number("size_square_feet"),
    text("spa_type"),
    number("space_index").or_default(FieldDefault::Zero),
    text("space_type"),
    text("space_type_index"),
    text("view_type"),
    text("visible_damage"),
    text("window_design_type"),
    text("window_material_type"),
    text("window_treatment_type"),
];

const LAYOUT_V2_FIELDS: &[FieldSpec] = &[
    text("cabinet_style"),
    text("clutter_level"),
    text("condition_issues"),
    text("countertop_material"),
    text("decor_elements"),
    text("design_style"),
    text("fixture_finish_quality"),
    text("floor_level"),
    text("flooring_material_type"),
    text("flooring_wear"),
    text("furnished"),
    boolean("has_windows"),
    boolean("is_exterior").or_default(FieldDefault::False),
    boolean("is_finished").or_default(FieldDefault::False),
    text("lighting_features"),
    text("natural_light_quality"),
    text("paint_condition"),
    text("pool_condition"),
    text("pool_equipment"),
    text("pool_surface_type"),
    text("pool_type"),
    text("pool_water_quality"),
    text("request_identifier"),
    text("safety_features"),
    number("size_square_feet"),
    text("spa_type"),
    number("space_index").or_default(FieldDefault::Zero),
    text("space_type"),
    text("space_type_index"),
    text("view_type"),
    text("visible_damage"),
    text("window_design_type"),
    text("window_material_type"),
    text("window_treatment_type"),
    text("building_number"),
    year("built_year"),
    text("story_type"),
    number("livable_area_sq_ft"),
    number("heated_area_sq_ft"),
    number("total_area_sq_ft"),
    number("area_under_air_sq_ft"),
    number("adjustable_area_sq_ft"),
];

const LOT_V1_FIELDS: &[FieldSpec] = &[text("request_identifier")];

const LOT_V2_FIELDS: &[FieldSpec] = &[
    text("request_identifier"),
    text("lot_type"),
    number("lot_length_feet"),
    number("lot_width_feet"),
    number("lot_area_sqft"),
    text("lot_size_acre"),
    text("landscaping_features"),
    text("view"),
    text("fencing_type"),
    number("fence_height"),
    number("fence_length"),
    text("driveway_material"),
    text("driveway_condition"),
    text("lot_condition_issues"),
];

const PARCEL_FIELDS: &[FieldSpec] = &[PARCEL_IDENTIFIER, text("request_identifier")];

const GEOMETRY_FIELDS: &[FieldSpec] = &[
    number("latitude"),
    number("longitude"),
    json_text("polygon"),
    text("request_identifier"),
];

const SEED_FIELDS: &[FieldSpec] = &[
    PARCEL_IDENTIFIER,
    text("request_identifier"),
    text("source_http_request"),
    text("unnormalized_address").read_from(&["unnormalized_address", "address"]),
    text("city_name"),
    text("postal_code"),
    text("state_code"),
    text("country_code"),
];

const IMPROVEMENT_FIELDS: &[FieldSpec] = &[
    text("improvement_type"),
    text("improvement_status"),
    text("improvement_action"),
    text("permit_number"),
    text("permit_issue_date"),
    text("permit_close_date"),
    text("application_received_date"),
    text("completion_date"),
    text("final_inspection_date"),
    text("contractor_type"),
    boolean("is_owner_builder"),
    boolean("is_disaster_recovery"),
    number("fee"),
    text("private_provider_plan_review"),
    text("private_provider_inspections"),
    text("request_identifier"),
];

const INSPECTION_FIELDS: &[FieldSpec] = &[
    text("completed_date"),
    text("completed_time"),
    text("inspection_number"),
    text("inspection_status"),
    text("permit_number"),
    text("requested_date"),
    text("scheduled_date"),
    text("request_identifier"),
];

const FILE_FIELDS: &[FieldSpec] = &[
    text("document_type"),
    text("file_format"),
    text("ipfs_url"),
    text("name"),
    text("original_url"),
    text("request_identifier"),
];

const COMPANY_FIELDS: &[FieldSpec] = &[text("name"), text("request_identifier")];

const PERSON_FIELDS: &[FieldSpec] = &[
    text("first_name"),
    text("last_name"),
    text("middle_name"),
    text("prefix_name"),
    text("suffix_name"),
    text("birth_date"),
    text("us_citizenship_status"),
    text("veteran_status"),
    text("request_identifier"),
];

const DEED_FIELDS: &[FieldSpec] = &[
    text("deed_type"),
    text("book"),
    text("page"),
    text("volume"),
    text("instrument_number"),
    text("request_identifier"),
];

const MAILING_ADDRESS_FIELDS: &[FieldSpec] = &[
    text("unnormalized_address"),
    number("latitude"),
    number("longitude"),
    text("request_identifier"),
];

pub(super) static SCHEMAS: &[Schema] = &[
    Schema {
        doc_type: DocumentType::Metadata,
        version: 1,
        discriminator: Discriminator::StringField("label"),
        fields: METADATA_FIELDS,
    },
    Schema {
        doc_type: DocumentType::Relationship,
        version: 1,
        discriminator: Discriminator::LinkField("to"),
        fields: RELATIONSHIP_FIELDS,
    },
    object(DocumentType::Property, 1, PROPERTY_FIELDS),
    object(DocumentType::Address, 1, ADDRESS_FIELDS),
    object(DocumentType::FactSheet, 1, FACT_SHEET_FIELDS),
    object(DocumentType::SalesHistory, 1, SALES_HISTORY_FIELDS),
    object(DocumentType::Tax, 1, TAX_FIELDS),
    object(DocumentType::Structure, 1, STRUCTURE_FIELDS),
    object(DocumentType::Utility, 1, UTILITY_FIELDS),
    object(DocumentType::Layout, 1, LAYOUT_V1_FIELDS),
    object(DocumentType::Layout, 2, LAYOUT_V2_FIELDS),
    object(DocumentType::Lot, 1, LOT_V1_FIELDS),
    object(DocumentType::Lot, 2, LOT_V2_FIELDS),
    object(DocumentType::Parcel, 1, PARCEL_FIELDS),
    object(DocumentType::Geometry, 1, GEOMETRY_FIELDS),
    object(DocumentType::Seed, 1, SEED_FIELDS),
    object(DocumentType::Improvement, 1, IMPROVEMENT_FIELDS),
    object(DocumentType::Inspection, 1, INSPECTION_FIELDS),
    object(DocumentType::File, 1, FILE_FIELDS),
    object(DocumentType::Company, 1, COMPANY_FIELDS),
    object(DocumentType::Person, 1, PERSON_FIELDS),
    object(DocumentType::Deed, 1, DEED_FIELDS),
    object(DocumentType::MailingAddress, 1, MAILING_ADDRESS_FIELDS),
];
