//! Cluster node representation

use crate::scan::Endpoint;

/// One line of CLUSTER NODES
#[derive(Debug, Clone)]
pub struct ClusterNode {
    /// Client address of the node
    pub endpoint: Endpoint,
    pub is_primary: bool,
    /// Number of slots served (primaries only)
    pub slot_count: u32,
}

/// Parse a line from CLUSTER NODES response
///
/// Format: `<id> <ip:port@cport> <flags> <master> <ping-sent> <pong-recv> <config-epoch> <link-state> <slot> <slot> ... <slot>`
pub fn parse_cluster_node_line(line: &str) -> Option<ClusterNode> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return None;
    }

    let endpoint = parse_node_address(parts[1])?;
    let is_primary = parts[2].split(',').any(|f| f == "master");

    // Saturating: a reply listing absurdly many ranges must not overflow
    let slot_count = if is_primary {
        parts[8..]
            .iter()
            .filter_map(|s| parse_slot_range(s))
            .fold(0u32, |total, (start, end)| {
                total.saturating_add(u32::from(end - start) + 1)
            })
    } else {
        0
    };

    Some(ClusterNode {
        endpoint,
        is_primary,
        slot_count,
    })
}

/// Parse node address from CLUSTER NODES
/// Formats: "host:port@cport", "host:port", "host:port@cport,hostname"
fn parse_node_address(addr: &str) -> Option<Endpoint> {
    let addr = addr.split(',').next().unwrap_or(addr);
    let host_port = addr.split('@').next().unwrap_or(addr);

    let (host, port) = host_port.rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;
    // Nodes without an address yet report ":0"
    if host.is_empty() || port == 0 {
        return None;
    }
    Some(Endpoint::new(host, port))
}

/// Parse slot range: "0-5460" or "0"
fn parse_slot_range(s: &str) -> Option<(u16, u16)> {
    // Skip migrating/importing markers like "[123->-node_id]"
    if s.contains('[') {
        return None;
    }

    match s.split_once('-') {
        Some((start, end)) => {
            let start: u16 = start.parse().ok()?;
            let end: u16 = end.parse().ok()?;
            (start <= end).then_some((start, end))
        }
        None => {
            let slot: u16 = s.parse().ok()?;
            Some((slot, slot))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primary_node() {
        let line = "07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:30001@31001 myself,master - 0 1426238316232 1 connected 0-5460";
        let node = parse_cluster_node_line(line).unwrap();

        assert_eq!(node.endpoint, Endpoint::new("127.0.0.1", 30001));
        assert!(node.is_primary);
        assert_eq!(node.slot_count, 5461);
    }

    #[test]
    fn test_parse_replica_node() {
        let line = "292f8b365bb7edb5e285caf0b7e6ddc7265d2f4f 127.0.0.1:30004@31004 slave 07c37dfeb235213a872192d90877d0cd55635b91 0 1426238317239 4 connected";
        let node = parse_cluster_node_line(line).unwrap();

        assert!(!node.is_primary);
        assert_eq!(node.slot_count, 0);
    }

    #[test]
    fn test_multiple_slot_ranges() {
        let line = "e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 10.0.0.2:6379@16379 master - 0 0 2 connected 0-99 200 [300->-abc] 400-409";
        let node = parse_cluster_node_line(line).unwrap();
        assert_eq!(node.slot_count, 111);
    }

    #[test]
    fn test_parse_node_address_variants() {
        assert_eq!(
            parse_node_address("10.0.0.1:6379@16379,hostname.example.com"),
            Some(Endpoint::new("10.0.0.1", 6379))
        );
        assert_eq!(
            parse_node_address("127.0.0.1:6379"),
            Some(Endpoint::new("127.0.0.1", 6379))
        );
        assert_eq!(parse_node_address(":0@0"), None);
    }

    #[test]
    fn test_parse_slot_range() {
        assert_eq!(parse_slot_range("0-5460"), Some((0, 5460)));
        assert_eq!(parse_slot_range("5461"), Some((5461, 5461)));
        assert_eq!(parse_slot_range("[123->-abc]"), None);
    }
}
