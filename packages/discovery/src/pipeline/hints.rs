//! Curated per-company notes folded into the initial search prompt.
//!
//! Keys are lowercase substrings of the company name. The first matching
//! entry wins, so more specific keys come before shorter ones.

const COMPANY_HINTS: &[(&str, &str)] = &[
    (
        "apple inc",
        "US company. Focus on SEC filings (10-K annual, 10-Q quarterly) and investor.apple.com. Fiscal year ends in late September.",
    ),
    (
        "microsoft corporation",
        "US company. Focus on SEC filings (10-K, 10-Q) and microsoft.com/en-us/investor. Fiscal year ends in June.",
    ),
    (
        "alphabet inc",
        "Google. US company. Focus on SEC filings (10-K, 10-Q) for Alphabet Inc. at abc.xyz/investor. Calendar fiscal year.",
    ),
    (
        "amazon",
        "US company. Focus on SEC filings (10-K, 10-Q) at ir.aboutamazon.com. Calendar fiscal year.",
    ),
    (
        "meta platforms",
        "Facebook/Meta. US company. Focus on SEC filings (10-K, 10-Q) and investor.fb.com.",
    ),
    (
        "oracle corp",
        "US company. Focus on SEC filings (10-K, 10-Q) and investor.oracle.com. Fiscal year ends in May.",
    ),
    (
        "procter & gamble",
        "US company. Focus on SEC filings (10-K, 10-Q) and pginvestor.com. Fiscal year ends in June.",
    ),
    (
        "hp inc",
        "US company. Focus on SEC filings (10-K, 10-Q) and investor.hp.com. Fiscal year ends in October.",
    ),
    (
        "dell technologies",
        "US company. Focus on SEC filings (10-K, 10-Q) and investors.delltechnologies.com. Fiscal year ends in January/February.",
    ),
    (
        "walt disney company",
        "US company. Focus on SEC filings (10-K, 10-Q) and thewaltdisneycompany.com/investor-relations. Fiscal year ends in September.",
    ),
    (
        "international business machines",
        "IBM. US company. Focus on SEC filings (10-K, 10-Q) and ibm.com/investor.",
    ),
    (
        "accenture plc",
        "Registered in Ireland. Look for 'Investor Relations' on the .com site and consider SEC filings (10-K/Q). Fiscal year ends in August.",
    ),
    (
        "johnson controls",
        "Registered in Ireland, headquartered in the US. Look for 'Investors' on the .com site and consider SEC filings (10-K/Q).",
    ),
    ("magna international", "Canadian company. Look for 'Investors' on the .com site."),
    (
        "publicis groupe",
        "French company (SA). Look for 'Investors' on the .com site and check for ESEF reports.",
    ),
    (
        "compagnie de saint gobain",
        "French company (SA). Look for 'Finance' or 'Investors' on the .com site and check for ESEF reports.",
    ),
    ("thyssenkrupp", "German company (AG). Look for 'Investoren' or 'Investors' on the .com site."),
    ("adecco group", "Swiss company (AG). Look for 'Investors' on the .com site."),
    ("vodafone group", "UK company (PLC). Look for 'Investors'. Fiscal year ends in March."),
    ("3i group", "UK company (PLC). Look for 'Investors'. Fiscal year ends in March."),
    ("gsk plc", "GlaxoSmithKline. UK company (PLC). Look for 'Investors'."),
    ("ferrero", "Private Italian/Luxembourg group. Public financial data is limited."),
    ("cargill", "Private US company. Public financial data is limited."),
    ("edizione", "Benetton family holding (Italy). Figures may only be published by subsidiaries."),
    (
        "atlas uk bidco",
        "UK acquisition vehicle. Probably publishes no own reports; look for the parent company.",
    ),
];

/// Curated note for a company, if one is known.
pub fn company_hint(name: &str) -> Option<&'static str> {
    let normalized = name.to_lowercase();
    COMPANY_HINTS
        .iter()
        .find(|(key, _)| normalized.contains(key))
        .map(|(_, hint)| *hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_substring_match() {
        let hint = company_hint("MICROSOFT CORPORATION").unwrap();
        assert!(hint.contains("June"));
        assert!(company_hint("Apple Inc.").unwrap().contains("September"));
    }

    #[test]
    fn test_unknown_company_has_no_hint() {
        assert_eq!(company_hint("Acme Corp"), None);
    }
}
