use serde::Deserialize;

/// Raw JSON:API envelope from the vehicles endpoint.
///
/// Deliberately loose: the upstream shape is nested and only partially
/// documented, so every field the normalizer cares about is optional and
/// unknown fields are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FeedPayload {
    #[serde(default)]
    pub data: Vec<RawVehicle>,
    #[serde(default)]
    pub included: Vec<RawIncluded>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawVehicle {
    #[serde(default)]
    pub attributes: RawVehicleAttributes,
    #[serde(default)]
    pub relationships: Option<RawRelationships>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawVehicleAttributes {
    /// Train number, e.g. "508".
    pub label: Option<String>,
    pub current_status: Option<String>,
    /// Delay in seconds; absent means on time.
    pub delay: Option<f64>,
    /// 0 = outbound, 1 = inbound.
    pub direction_id: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawRelationships {
    #[serde(default)]
    pub stop: Option<RawStopRelation>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawStopRelation {
    #[serde(default)]
    pub data: Option<RawStopRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStopRef {
    pub id: String,
}

/// Side-loaded resource from the `included` array. Only `stop` entries
/// are used (stop id → display name).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawIncluded {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Option<RawIncludedAttributes>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawIncludedAttributes {
    pub name: Option<String>,
}
