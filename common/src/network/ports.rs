//! # Port Specifications
//!
//! Parses the operator's port specification into a [`PortSet`].
//!
//! Accepted forms:
//! * **Single**: `"443"`
//! * **List**: `"22,80,443"`
//! * **Range**: `"1000-2000"` (inclusive, ascending)
//! * **Preset**: `"top100"` or `"top1000"`
//!
//! Every port must lie in `1..=65535`. Lists and ranges cannot be mixed in one
//! specification.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::SpecError;

pub const TOP_100: [u16; 164] = [
    21, 22, 80, 81, 135, 139, 443, 445, 1433, 1521, 3306, 5432,
    6379, 7001, 8000, 8080, 8089, 9000, 9200, 11211, 27017, 82, 83, 84,
    85, 86, 87, 88, 89, 90, 91, 1000, 1010, 1080, 1081, 1082,
    1099, 2008, 2375, 2379, 7000, 7002, 7003, 7004, 7005, 7007, 7008, 7070,
    7071, 7074, 7078, 7080, 7088, 7200, 7680, 7687, 7688, 7777, 7890, 8001,
    8002, 8003, 8004, 8006, 8008, 8009, 8010, 8011, 8012, 8016, 8018, 8020,
    8028, 8030, 8038, 8042, 8044, 8046, 8048, 8053, 8060, 8069, 8070, 8081,
    8082, 8083, 8084, 8085, 8086, 8087, 8088, 8090, 8091, 8092, 8093, 8094,
    8095, 8096, 8097, 8098, 8099, 8100, 8101, 8108, 8118, 8161, 8172, 8180,
    8181, 8200, 8222, 8244, 8258, 8280, 8288, 8300, 8360, 8443, 8448, 8484,
    8800, 8834, 8848, 8858, 8888, 9001, 9002, 9008, 9010, 9043, 9060, 9080,
    9090, 9443, 9448, 10000, 10001, 10002, 10004, 10008, 10010, 10250, 12018, 12443,
    14000, 16080, 18000, 18001, 18002, 18004, 18008, 18080, 18082, 18088, 18090, 18098,
    19001, 20000, 20720, 21000, 21501, 21502, 28018, 20880,
];

pub const TOP_1000: [u16; 992] = [
    20, 21, 22, 23, 24, 25, 26, 30, 32, 33, 37, 42,
    43, 49, 53, 70, 79, 80, 81, 82, 83, 84, 85, 88,
    89, 90, 99, 100, 106, 109, 110, 111, 113, 119, 125, 135,
    139, 143, 144, 146, 161, 163, 179, 199, 211, 212, 222, 254,
    255, 256, 259, 264, 280, 301, 306, 311, 340, 366, 389, 406,
    407, 416, 417, 425, 427, 443, 444, 445, 458, 464, 465, 481,
    497, 500, 512, 513, 514, 515, 524, 541, 543, 544, 545, 548,
    554, 555, 563, 587, 593, 616, 617, 625, 631, 636, 646, 648,
    666, 667, 668, 683, 687, 691, 700, 705, 711, 714, 720, 722,
    726, 749, 765, 777, 783, 787, 800, 801, 808, 843, 873, 880,
    888, 898, 900, 901, 902, 903, 911, 912, 981, 987, 990, 992,
    993, 995, 999, 1000, 1001, 1002, 1007, 1009, 1010, 1011, 1021, 1022,
    1023, 1024, 1025, 1026, 1027, 1028, 1029, 1030, 1031, 1032, 1033, 1034,
    1035, 1036, 1037, 1038, 1039, 1040, 1041, 1042, 1043, 1044, 1045, 1046,
    1047, 1048, 1049, 1050, 1051, 1052, 1053, 1054, 1055, 1056, 1057, 1058,
    1059, 1060, 1061, 1062, 1063, 1064, 1065, 1066, 1067, 1068, 1069, 1070,
    1071, 1072, 1073, 1074, 1075, 1076, 1077, 1078, 1079, 1080, 1081, 1082,
    1083, 1084, 1085, 1086, 1087, 1088, 1089, 1090, 1091, 1092, 1093, 1094,
    1095, 1096, 1097, 1098, 1099, 1100, 1102, 1104, 1105, 1106, 1107, 1108,
    1110, 1111, 1112, 1113, 1114, 1117, 1119, 1121, 1122, 1123, 1124, 1126,
    1130, 1131, 1132, 1137, 1138, 1141, 1145, 1147, 1148, 1149, 1151, 1152,
    1154, 1163, 1164, 1165, 1166, 1169, 1174, 1175, 1183, 1185, 1186, 1187,
    1192, 1198, 1199, 1201, 1213, 1216, 1217, 1218, 1233, 1234, 1236, 1244,
    1247, 1248, 1259, 1271, 1272, 1277, 1287, 1296, 1300, 1301, 1309, 1310,
    1311, 1322, 1328, 1334, 1352, 1417, 1433, 1434, 1443, 1455, 1461, 1494,
    1500, 1501, 1503, 1521, 1524, 1533, 1556, 1580, 1583, 1594, 1600, 1641,
    1658, 1666, 1687, 1688, 1700, 1717, 1718, 1719, 1720, 1721, 1723, 1755,
    1761, 1782, 1783, 1801, 1805, 1812, 1839, 1840, 1862, 1863, 1864, 1875,
    1900, 1914, 1935, 1947, 1971, 1972, 1974, 1984, 1998, 1999, 2000, 2001,
    2002, 2003, 2004, 2005, 2006, 2007, 2008, 2009, 2010, 2013, 2020, 2021,
    2022, 2030, 2033, 2034, 2035, 2038, 2040, 2041, 2042, 2043, 2045, 2046,
    2047, 2048, 2049, 2065, 2068, 2099, 2100, 2103, 2105, 2106, 2107, 2111,
    2119, 2121, 2126, 2135, 2144, 2160, 2161, 2170, 2179, 2190, 2191, 2196,
    2200, 2222, 2251, 2260, 2288, 2301, 2323, 2366, 2381, 2382, 2383, 2393,
    2394, 2399, 2401, 2492, 2500, 2522, 2525, 2557, 2601, 2602, 2604, 2605,
    2607, 2608, 2638, 2701, 2702, 2710, 2717, 2718, 2725, 2800, 2809, 2811,
    2869, 2875, 2909, 2910, 2920, 2967, 2968, 2998, 3000, 3001, 3003, 3005,
    3006, 3007, 3011, 3013, 3017, 3030, 3031, 3052, 3071, 3077, 3128, 3168,
    3211, 3221, 3260, 3261, 3268, 3269, 3283, 3300, 3301, 3306, 3322, 3323,
    3324, 3325, 3333, 3351, 3367, 3369, 3370, 3371, 3372, 3389, 3390, 3404,
    3476, 3493, 3517, 3527, 3546, 3551, 3580, 3659, 3689, 3690, 3703, 3737,
    3766, 3784, 3800, 3801, 3809, 3814, 3826, 3827, 3828, 3851, 3869, 3871,
    3878, 3880, 3889, 3905, 3914, 3918, 3920, 3945, 3971, 3986, 3995, 3998,
    4000, 4001, 4002, 4003, 4004, 4005, 4006, 4045, 4111, 4125, 4126, 4129,
    4224, 4242, 4279, 4321, 4343, 4443, 4444, 4445, 4446, 4449, 4550, 4567,
    4662, 4848, 4899, 4900, 4998, 5000, 5001, 5002, 5003, 5004, 5009, 5030,
    5033, 5050, 5051, 5054, 5060, 5061, 5080, 5087, 5100, 5101, 5102, 5120,
    5190, 5200, 5214, 5221, 5222, 5225, 5226, 5269, 5280, 5298, 5357, 5405,
    5414, 5431, 5432, 5440, 5500, 5510, 5544, 5550, 5555, 5560, 5566, 5631,
    5633, 5666, 5678, 5679, 5718, 5730, 5800, 5801, 5802, 5810, 5811, 5815,
    5822, 5825, 5850, 5859, 5862, 5877, 5900, 5901, 5902, 5903, 5904, 5906,
    5907, 5910, 5911, 5915, 5922, 5925, 5950, 5952, 5959, 5960, 5961, 5962,
    5963, 5987, 5988, 5989, 5998, 5999, 6000, 6001, 6002, 6003, 6004, 6005,
    6006, 6007, 6009, 6025, 6059, 6100, 6101, 6106, 6112, 6123, 6129, 6156,
    6346, 6379, 6389, 6502, 6510, 6543, 6547, 6565, 6566, 6567, 6580, 6646,
    6666, 6667, 6668, 6669, 6689, 6692, 6699, 6779, 6788, 6789, 6792, 6839,
    6881, 6901, 6969, 7000, 7001, 7002, 7004, 7007, 7019, 7025, 7070, 7100,
    7103, 7106, 7200, 7201, 7402, 7435, 7443, 7496, 7512, 7625, 7627, 7676,
    7741, 7777, 7778, 7800, 7911, 7920, 7921, 7937, 7938, 7999, 8000, 8001,
    8002, 8007, 8008, 8009, 8010, 8011, 8021, 8022, 8031, 8042, 8045, 8080,
    8081, 8082, 8083, 8084, 8085, 8086, 8087, 8088, 8089, 8090, 8093, 8099,
    8100, 8180, 8181, 8192, 8193, 8194, 8200, 8222, 8254, 8290, 8291, 8292,
    8300, 8333, 8383, 8400, 8402, 8443, 8500, 8600, 8649, 8651, 8652, 8654,
    8701, 8800, 8873, 8888, 8899, 8994, 9000, 9001, 9002, 9003, 9009, 9010,
    9011, 9040, 9050, 9071, 9080, 9081, 9090, 9091, 9099, 9100, 9101, 9102,
    9103, 9110, 9111, 9200, 9207, 9220, 9290, 9415, 9418, 9485, 9500, 9502,
    9503, 9535, 9575, 9593, 9594, 9595, 9618, 9666, 9876, 9877, 9878, 9898,
    9900, 9917, 9929, 9943, 9944, 9968, 9998, 9999, 10000, 10001, 10002, 10003,
    10004, 10009, 10010, 10012, 10024, 10025, 10082, 10180, 10215, 10243, 10566, 10616,
    10617, 10621, 10626, 10628, 10629, 10778, 11110, 11111, 11967, 12000, 12174, 12265,
    12345, 13456, 13722, 13782, 13783, 14000, 14238, 14441, 14442, 15000, 15002, 15003,
    15004, 15660, 15742, 16000, 16001, 16012, 16016, 16018, 16080, 16113, 16992, 16993,
    17877, 17988, 18040, 18101, 18988, 19101, 19283, 19315, 19350, 19780, 19801, 19842,
    20000, 20005, 20031, 20221, 20222, 20828, 21571, 22939, 23502, 24444, 24800, 25734,
    25735, 26214, 27000, 27352, 27353, 27355, 27356, 27715, 28201, 30000, 30718, 30951,
    31038, 31337, 32768, 32769, 32770, 32771, 32772, 32773, 32774, 32775, 32776, 32777,
    32778, 32779, 32780, 32781, 32782, 32783, 32784, 32785, 33354, 33899, 34571, 34572,
    34573, 35500, 38292, 40193, 40911, 41511, 42510, 44176, 44442, 44443, 44501, 45100,
    48080, 49152, 49153, 49154, 49155, 49156, 49157, 49158, 49159, 49160, 49161, 49163,
    49165, 49167, 49175, 49176, 49400, 49999, 50000, 50001, 50002, 50003, 50006, 50300,
    50389, 50500, 50636, 50800, 51103, 51493, 52673, 52822, 52848, 52869, 54045, 54328,
    55055, 55056, 55555, 55600, 56737, 56738, 57294, 57797, 58080, 60020, 60443, 61532,
    61900, 62078, 63331, 64623, 64680, 65000, 65129, 65389,
];

/// Ports tried, in this order, when confirming hosts that ignore ICMP echo.
pub const LIVENESS_PORTS: &[u16] = &TOP_100;

/// An ordered sequence of distinct, valid TCP ports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortSet {
    ports: Vec<u16>,
}

impl PortSet {
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &u16> + Clone {
        self.ports.iter()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }
}

/// Collects ports, keeping the first occurrence of each.
impl FromIterator<u16> for PortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut seen: HashSet<u16> = HashSet::new();
        let ports: Vec<u16> = iter.into_iter().filter(|port| seen.insert(*port)).collect();
        Self { ports }
    }
}

impl FromStr for PortSet {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        expand(s)
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.ports.iter().map(u16::to_string).collect();
        f.write_str(&joined.join(","))
    }
}

/// Which branch a specification falls into. Validation and expansion both go
/// through [`classify`], so they can never disagree.
#[derive(Debug, PartialEq, Eq)]
enum PortSpec {
    Single(u16),
    List(Vec<u16>),
    Range { start: u16, end: u16 },
    Preset(&'static [u16]),
}

/// Checks a specification without expanding it.
pub fn validate(spec: &str) -> Result<(), SpecError> {
    classify(spec).map(|_| ())
}

pub fn is_valid(spec: &str) -> bool {
    validate(spec).is_ok()
}

/// Expands a specification into its ports.
///
/// A range whose start exceeds its end is valid and expands to an empty set.
pub fn expand(spec: &str) -> Result<PortSet, SpecError> {
    let ports: PortSet = match classify(spec)? {
        PortSpec::Single(port) => PortSet { ports: vec![port] },
        PortSpec::List(ports) => ports.into_iter().collect(),
        PortSpec::Range { start, end } => (start..=end).collect(),
        PortSpec::Preset(ports) => ports.iter().copied().collect(),
    };
    Ok(ports)
}

fn classify(spec: &str) -> Result<PortSpec, SpecError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(SpecError::InvalidPortSpec(spec.to_string()));
    }

    if is_number(spec) {
        return parse_port(spec, spec).map(PortSpec::Single);
    }

    let has_comma = spec.contains(',');
    let has_dash = spec.contains('-');

    if has_comma && has_dash {
        return Err(SpecError::AmbiguousPortSpec(spec.to_string()));
    }

    if has_comma {
        let ports = spec
            .split(',')
            .map(|part| parse_port(spec, part.trim()))
            .collect::<Result<Vec<u16>, SpecError>>()?;
        return Ok(PortSpec::List(ports));
    }

    if has_dash {
        let Some((start, end)) = spec.split_once('-') else {
            return Err(SpecError::InvalidPortSpec(spec.to_string()));
        };
        let start = parse_port(spec, start.trim())?;
        let end = parse_port(spec, end.trim())?;
        return Ok(PortSpec::Range { start, end });
    }

    match spec.to_ascii_lowercase().as_str() {
        "top100" => Ok(PortSpec::Preset(&TOP_100)),
        "top1000" => Ok(PortSpec::Preset(&TOP_1000)),
        _ => Err(SpecError::InvalidPortSpec(spec.to_string())),
    }
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_port(spec: &str, token: &str) -> Result<u16, SpecError> {
    if !is_number(token) {
        return Err(SpecError::InvalidPortSpec(spec.to_string()));
    }

    let out_of_range = || SpecError::PortOutOfRange {
        spec: spec.to_string(),
        value: token.to_string(),
    };

    match token.parse::<u32>() {
        Ok(port @ 1..=65535) => Ok(port as u16),
        _ => Err(out_of_range()),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_port() {
        assert_eq!(expand("443").unwrap().as_slice(), &[443]);
        assert_eq!(expand("1").unwrap().as_slice(), &[1]);
        assert_eq!(expand("65535").unwrap().as_slice(), &[65535]);
    }

    #[test]
    fn list_keeps_order() {
        assert_eq!(expand("80,443").unwrap().as_slice(), &[80, 443]);
        assert_eq!(expand("443, 22 ,80").unwrap().as_slice(), &[443, 22, 80]);
    }

    #[test]
    fn list_drops_duplicates() {
        assert_eq!(expand("80,443,80,22,443").unwrap().as_slice(), &[80, 443, 22]);
    }

    #[test]
    fn range_is_inclusive_and_ascending() {
        let ports = expand("100-105").unwrap();
        assert_eq!(ports.as_slice(), &[100, 101, 102, 103, 104, 105]);
        assert_eq!(expand("1-65535").unwrap().len(), 65535);
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(is_valid("2000-1000"));
        assert!(expand("2000-1000").unwrap().is_empty());
    }

    #[test]
    fn presets() {
        let top100 = expand("top100").unwrap();
        let top1000 = expand("TOP1000").unwrap();
        assert_eq!(top100.len(), TOP_100.len());
        assert_eq!(top1000.len(), TOP_1000.len());
        assert_eq!(top100.as_slice()[..3], [21, 22, 80]);
    }

    #[test]
    fn presets_have_no_duplicates() {
        for preset in [&TOP_100[..], &TOP_1000[..]] {
            let unique: HashSet<u16> = preset.iter().copied().collect();
            assert_eq!(unique.len(), preset.len());
            assert!(!preset.contains(&0));
        }
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(matches!(
            validate("70000"),
            Err(SpecError::PortOutOfRange { .. })
        ));
        assert!(!is_valid("0"));
        assert!(!is_valid("80,65536"));
        assert!(!is_valid("0-100"));
        assert!(!is_valid("99999999999999999999"));
    }

    #[test]
    fn malformed_specs_are_rejected() {
        for spec in ["", "http", "80,", ",80", "80,,443", "-80", "80-", "1-2-3", "top10", "+80", "8 0"] {
            assert!(!is_valid(spec), "'{spec}' should be rejected");
        }
    }

    #[test]
    fn mixed_separators_are_ambiguous() {
        assert_eq!(
            validate("22,100-200"),
            Err(SpecError::AmbiguousPortSpec("22,100-200".to_string()))
        );
    }

    #[test]
    fn expansion_stays_in_port_range() {
        for spec in ["1-1000", "top100", "top1000", "1,2,65535"] {
            let ports = expand(spec).unwrap();
            assert!(ports.iter().all(|port| *port >= 1));
        }
    }

    #[test]
    fn from_str_and_display() {
        let ports: PortSet = "22,80".parse().unwrap();
        assert_eq!(ports.to_string(), "22,80");
    }
}
