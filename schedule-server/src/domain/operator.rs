//! Train operator names by ATOC code.

/// Label used by upstream for freight and other non-passenger operators,
/// whose real identity is obfuscated as `ZZ`.
const OBFUSCATED_OPERATOR: &str = "Non-passenger (operator name obfuscated)";

/// A train operating company as listed in the industry code tables.
struct Operator {
    name: &'static str,
    atoc_code: &'static str,
}

const OPERATORS: &[Operator] = &[
    Operator { name: "Virtual European Paths", atoc_code: "EU" },
    Operator { name: "Alliance Rail", atoc_code: "AR" },
    Operator { name: "Northern Trains", atoc_code: "NT" },
    Operator { name: "Transport for Wales", atoc_code: "AW" },
    Operator { name: "c2c", atoc_code: "CC" },
    Operator { name: "Caledonian Sleeper", atoc_code: "CS" },
    Operator { name: "Chiltern Railways", atoc_code: "CH" },
    Operator { name: "CrossCountry", atoc_code: "XC" },
    Operator { name: "East Midlands Railway", atoc_code: "EM" },
    Operator { name: "Eurostar", atoc_code: "ES" },
    Operator { name: "Hull Trains", atoc_code: "HT" },
    Operator { name: "Govia Thameslink Railway (Great Northern)", atoc_code: "GN" },
    Operator { name: "Govia Thameslink Railway (Thameslink)", atoc_code: "TL" },
    Operator { name: "Grand Central", atoc_code: "GC" },
    Operator { name: "Great Western Railway", atoc_code: "GW" },
    Operator { name: "Greater Anglia", atoc_code: "LE" },
    Operator { name: "Heathrow Connect", atoc_code: "HC" },
    Operator { name: "Heathrow Express", atoc_code: "HX" },
    Operator { name: "Island Lines", atoc_code: "IL" },
    Operator { name: "Locomotive Services", atoc_code: "LS" },
    Operator { name: "West Midlands Trains", atoc_code: "LM" },
    Operator { name: "London Overground", atoc_code: "LO" },
    Operator { name: "LUL Bakerloo Line", atoc_code: "LT" },
    Operator { name: "LUL District Line - Richmond", atoc_code: "LT" },
    Operator { name: "LUL District Line - Wimbledon", atoc_code: "LT" },
    Operator { name: "Merseyrail", atoc_code: "ME" },
    Operator { name: "Network Rail (On-Track Machines)", atoc_code: "LR" },
    Operator { name: "Nexus (Tyne & Wear Metro)", atoc_code: "TW" },
    Operator { name: "North Yorkshire Moors Railway", atoc_code: "NY" },
    Operator { name: "ScotRail", atoc_code: "SR" },
    Operator { name: "South Western Railway", atoc_code: "SW" },
    Operator { name: "South Yorkshire Supertram", atoc_code: "SJ" },
    Operator { name: "Southeastern", atoc_code: "SE" },
    Operator { name: "Southern", atoc_code: "SN" },
    Operator { name: "Swanage Railway", atoc_code: "SP" },
    Operator { name: "Elizabeth line", atoc_code: "XR" },
    Operator { name: "TransPennine Express", atoc_code: "TP" },
    Operator { name: "Avanti West Coast", atoc_code: "VT" },
    Operator { name: "London North Eastern Railway", atoc_code: "GR" },
    Operator { name: "West Coast Railways", atoc_code: "WR" },
    Operator { name: "Grand Union Trains", atoc_code: "LF" },
];

/// Look up the operator name for an ATOC code.
///
/// Where a code is shared (London Underground lines all use `LT`) the first
/// listed operator wins.
///
/// # Examples
///
/// ```
/// use schedule_server::domain::operator_name;
///
/// assert_eq!(operator_name("GW"), "Great Western Railway");
/// assert_eq!(operator_name("QQ"), "Unknown operator code 'QQ'");
/// ```
pub fn operator_name(atoc_code: &str) -> String {
    if atoc_code == "ZZ" {
        return OBFUSCATED_OPERATOR.to_string();
    }

    OPERATORS
        .iter()
        .find(|op| op.atoc_code == atoc_code)
        .map(|op| op.name.to_string())
        .unwrap_or_else(|| format!("Unknown operator code '{atoc_code}'"))
}
