//! Human-readable descriptions of CIF codes.
//!
//! These are display helpers only. A code that is not in a table yields a
//! placeholder rather than an error, since upstream adds codes over time.

/// Placeholder for codes that are not in a table.
pub const DESCRIPTION_NOT_FOUND: &str = "Description not found";

const TRAIN_CATEGORIES: &[(&str, &str)] = &[
    ("OL", "London Underground/Metro Service"),
    ("OU", "Unadvertised Ordinary Passenger"),
    ("OO", "Ordinary Passenger"),
    ("OS", "Staff Train"),
    ("OW", "Mixed"),
    ("XC", "Channel Tunnel"),
    ("XD", "Sleeper (Europe Night Services)"),
    ("XI", "International"),
    ("XR", "Motorail"),
    ("XU", "Unadvertised Express"),
    ("XX", "Express Passenger"),
    ("XZ", "Sleeper (Domestic)"),
    ("BR", "Bus – Replacement due to engineering work"),
    ("BS", "Bus – WTT Service"),
    ("SS", "Ship"),
    ("EE", "Empty Coaching Stock (ECS)"),
    ("EL", "ECS, London Underground/Metro Service"),
    ("ES", "ECS & Staff"),
    ("JJ", "Postal"),
    ("PM", "Post Office Controlled Parcels"),
    ("PP", "Parcels"),
    ("PV", "Empty NPCCS"),
    ("DD", "Departmental"),
    ("DH", "Civil Engineer"),
    ("DI", "Mechanical & Electrical Engineer"),
    ("DQ", "Stores"),
    ("DT", "Test"),
    ("DY", "Signal & Telecommunications Engineer"),
    ("ZB", "Locomotive & Brake Van"),
    ("ZZ", "Light Locomotive"),
    ("J2", "RfD Automotive (Components)"),
    ("H2", "RfD Automotive (Vehicles)"),
    ("J3", "RfD Edible Products (UK Contracts)"),
    ("J4", "RfD Industrial Minerals (UK Contracts)"),
    ("J5", "RfD Chemicals (UK Contracts)"),
    ("J6", "RfD Building Materials (UK Contracts)"),
    ("J8", "RfD General Merchandise (UK Contracts)"),
    ("H8", "RfD European"),
    ("J9", "RfD Freightliner (Contracts)"),
    ("H9", "RfD Freightliner (Other)"),
    ("A0", "Coal (Distributive)"),
    ("E0", "Coal (Electricity) MGR"),
    ("B0", "Coal (Other) and Nuclear"),
    ("B1", "Metals"),
    ("B4", "Aggregates"),
    ("B5", "Domestic and Industrial Waste"),
    ("B6", "Building Materials (TLF)"),
    ("B7", "Petroleum Products"),
    ("H0", "RfD European Channel Tunnel (Mixed Business)"),
    ("H1", "RfD European Channel Tunnel Intermodal"),
    ("H3", "RfD European Channel Tunnel Automotive"),
    ("H4", "RfD European Channel Tunnel Contract Services"),
    ("H5", "RfD European Channel Tunnel Haulmark"),
    ("H6", "RfD European Channel Tunnel Joint Venture"),
];

const OPERATING_CHARACTERISTICS: &[(char, &str)] = &[
    ('B', "Vacuum Braked"),
    ('C', "Timed at 100 m.p.h."),
    ('D', "DOO (Coaching stock trains)"),
    ('E', "Conveys Mark 4 Coaches"),
    ('G', "Trainman (Guard) required"),
    ('M', "Timed at 110 m.p.h."),
    ('P', "Push/Pull train"),
    ('Q', "Runs as required"),
    ('R', "Air conditioned with PA system"),
    ('S', "Steam Heated"),
    ('Y', "Runs to Terminals/Yards as required"),
    (
        'Z',
        "May convey traffic to SB1C gauge. Not to be diverted from booked route without authority.",
    ),
];

const POWER_TYPES: &[(&str, &str)] = &[
    ("D", "Diesel"),
    ("DEM", "Diesel Electric Multiple Unit"),
    ("DMU", "Diesel Mechanical Multiple Unit"),
    ("E", "Electric"),
    ("ED", "Electro-Diesel"),
    ("EML", "EMU plus D, E, ED locomotive"),
    ("EMU", "Electric Multiple Unit"),
    ("HST", "High Speed Train"),
];

const TRAIN_STATUSES: &[(&str, &str)] = &[
    ("B", "Bus (Permanent)"),
    ("F", "Freight (Permanent - WTT)"),
    ("P", "Passenger & Parcels (Permanent - WTT)"),
    ("S", "Ship (Permanent)"),
    ("T", "Trip (Permanent)"),
    ("1", "STP Passenger & Parcels"),
    ("2", "STP Freight"),
    ("3", "STP Trip"),
    ("4", "STP Ship"),
    ("5", "STP Bus"),
];

/// Timing loads that are looked up by (power types, code).
const TIMING_LOADS: &[(&[&str], &str, &str)] = &[
    (&["DMU"], "69", "Class 172/0, 172/1 or 172/2"),
    (&["DMU"], "A", "Class 141 to 144"),
    (&["DMU"], "E", "Class 158, 168, 170 or 175"),
    (&["DMU"], "N", "Class 165/0"),
    (&["DMU"], "S", "Class 150, 153, 155 or 156"),
    (&["DMU"], "T", "Class 165/1 or 166"),
    (&["DMU"], "V", "Class 220 or 221"),
    (&["DMU"], "X", "Class 159"),
    (&["DMU"], "D1", "DMU (Power Car + Trailer)"),
    (&["DMU"], "D2", "DMU (2 Power Cars + Trailer)"),
    (&["DMU"], "D3", "DMU (Power Twin)"),
    (&["EMU"], "AT", "Accelerated Timings"),
    (&["EMU"], "E", "Class 458"),
    (&["EMU"], "0", "Class 380"),
    (&["EMU"], "506", "Class 350/1 (110 mph)"),
    (&["D", "E", "ED"], "325 (E)", "Class 325 Electric Parcels Unit"),
];

fn lookup(table: &[(&str, &'static str)], code: &str) -> &'static str {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, d)| *d)
        .unwrap_or(DESCRIPTION_NOT_FOUND)
}

/// Describe a `CIF_train_category` code.
pub fn train_category(code: &str) -> &'static str {
    lookup(TRAIN_CATEGORIES, code)
}

/// Describe a `CIF_power_type` code.
pub fn power_type(code: &str) -> &'static str {
    lookup(POWER_TYPES, code)
}

/// Describe a `train_status` code.
pub fn train_status(code: &str) -> &'static str {
    lookup(TRAIN_STATUSES, code)
}

/// Describe a `CIF_operating_characteristics` field.
///
/// The field packs up to six one-letter codes; every recognised letter
/// contributes a description, joined with `", "`. Returns an empty string
/// when nothing matches.
pub fn operating_characteristics(codes: &str) -> String {
    OPERATING_CHARACTERISTICS
        .iter()
        .filter(|(c, _)| codes.contains(*c))
        .map(|(_, d)| *d)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Describe a `CIF_timing_load` code, which is only meaningful together with
/// the power type.
///
/// Numeric loads on locomotive power types are tonnages; numeric loads on
/// EMUs are class numbers (except the two EMU codes that are in the table).
pub fn timing_load(code: &str, power_type: &str) -> String {
    if code.is_empty() {
        return String::new();
    }

    if let Ok(numeric) = code.parse::<u32>() {
        match power_type {
            "D" | "E" | "ED" => return format!("{code} tonnes load"),
            "EMU" if numeric != 0 && numeric != 506 => return format!("Class {code}"),
            _ => {}
        }
    }

    TIMING_LOADS
        .iter()
        .find(|(power_types, c, _)| *c == code && power_types.contains(&power_type))
        .map(|(_, _, d)| (*d).to_string())
        .unwrap_or_else(|| format!("Description for timing load '{code}' not found"))
}
