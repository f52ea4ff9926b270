//! Diesel table definitions for the Folio data model.

diesel::table! {
    stories (id) {
        id -> Int8,
        status -> Text,
        title -> Text,
        author -> Text,
        page_count -> Int4,
        style_reference_url -> Nullable<Text>,
        interior_reference_urls -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    pages (id) {
        id -> Int8,
        story_id -> Int8,
        page_number -> Int4,
        body -> Text,
    }
}

diesel::table! {
    characters (id) {
        id -> Int8,
        name -> Text,
        description -> Text,
    }
}

diesel::table! {
    locations (id) {
        id -> Int8,
        name -> Text,
        description -> Text,
    }
}

diesel::table! {
    story_characters (story_id, character_id) {
        story_id -> Int8,
        character_id -> Int8,
    }
}

diesel::table! {
    story_locations (story_id, location_id) {
        story_id -> Int8,
        location_id -> Int8,
    }
}

diesel::table! {
    spreads (id) {
        id -> Int8,
        story_id -> Int8,
        spread_index -> Int4,
        left_page_id -> Int8,
        right_page_id -> Nullable<Int8>,
        scene_summary -> Text,
    }
}

diesel::table! {
    page_characters (page_id, character_id) {
        page_id -> Int8,
        character_id -> Int8,
        prominence -> Text,
        justification -> Text,
    }
}

diesel::table! {
    page_locations (page_id, location_id) {
        page_id -> Int8,
        location_id -> Int8,
    }
}

diesel::table! {
    spread_presences (spread_id) {
        spread_id -> Int8,
        primary_location_id -> Nullable<Int8>,
    }
}

diesel::table! {
    spread_presence_characters (id) {
        id -> Int8,
        spread_id -> Int8,
        character_id -> Int8,
        role -> Text,
        confidence -> Float4,
        reason -> Text,
    }
}

diesel::table! {
    spread_excluded_characters (id) {
        id -> Int8,
        spread_id -> Int8,
        character_id -> Int8,
        reason -> Text,
    }
}

diesel::table! {
    spread_scenes (spread_id) {
        spread_id -> Int8,
        scene_summary -> Text,
        illustration_prompt -> Text,
        composition_notes -> Text,
        mood -> Text,
        do_not_include -> Text,
        negative_prompt -> Text,
    }
}

diesel::table! {
    cover_assets (story_id, kind) {
        story_id -> Int8,
        kind -> Text,
        prompt -> Text,
        url -> Nullable<Text>,
    }
}

diesel::table! {
    model_calls (id) {
        id -> Int8,
        story_id -> Int8,
        stage -> Text,
        provider -> Text,
        model -> Text,
        request_prompt -> Text,
        response_text -> Nullable<Text>,
        duration_ms -> Int4,
        error_message -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(pages -> stories (story_id));
diesel::joinable!(spreads -> stories (story_id));
diesel::joinable!(spread_presences -> spreads (spread_id));
diesel::joinable!(spread_scenes -> spreads (spread_id));
diesel::joinable!(cover_assets -> stories (story_id));
diesel::joinable!(model_calls -> stories (story_id));

diesel::allow_tables_to_appear_in_same_query!(
    stories,
    pages,
    characters,
    locations,
    story_characters,
    story_locations,
    spreads,
    page_characters,
    page_locations,
    spread_presences,
    spread_presence_characters,
    spread_excluded_characters,
    spread_scenes,
    cover_assets,
    model_calls,
);
