/// Label reported for ports that are not in the service table.
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Well-known TCP ports and the service usually listening on them.
pub const SERVICES: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (3389, "RDP"),
];

/// Resolve the service label for a port, or [`UNKNOWN_SERVICE`] when unmapped.
pub fn lookup(port: u16) -> &'static str {
    SERVICES
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_SERVICE)
}
