#![allow(clippy::panic_in_result_fn)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

#[cfg(test)]
mod formatter_tests {
    use vmsg2xml::{
        convert_batch, documents_equal, parse_file,
        utils::{format_vmsg, format_xml, parse_vmsg},
        BatchConfig, BatchSource, FormatConfig, Formatter, ParserConfig, Result, VmsgParser,
        XmlFormatter,
    };

    const INBOX_MESSAGE: &str = "tests/input/inbox_message.vmg";

    #[test]
    fn test_fixture_as_xml() -> Result<()> {
        let doc = parse_file(INBOX_MESSAGE, &ParserConfig::default())?;
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<VMSG VERSION="1.1" X-IRMC-STATUS="READ" X-IRMC-BOX="INBOX">
    <VCARD VERSION="2.1" N="" TEL="+61412345678"/>
    <VENV>
        <VENV>
            <VBODY Date="26.10.2008 18:42:07">
                Yes thanks, see you then
                Call me: after 7
            </VBODY>
        </VENV>
    </VENV>
</VMSG>
"#;
        assert_eq!(format_xml(&doc), expected);
        Ok(())
    }

    #[test]
    fn test_batch_container_as_xml() -> Result<()> {
        let sources = [
            BatchSource::memory("a.vmg", "BEGIN:VMSG\nBEGIN:VBODY\nhi\nEND:VBODY\nEND:VMSG\n"),
            BatchSource::memory("b.vmg", "BEGIN:VMSG\nX-IRMC-BOX:SENT\nEND:VMSG\n"),
        ];
        let report = convert_batch(&sources, &BatchConfig::default())?;
        let config = FormatConfig {
            indent_spaces: 2,
            xml_declaration: false,
        };
        let expected = "<bjf:messages xmlns:bjf=\"http://bjf.id.au/vmsgreader\">\n  \
                        <VMSG>\n    <VBODY>hi</VBODY>\n  </VMSG>\n  \
                        <VMSG X-IRMC-BOX=\"SENT\"/>\n\
                        </bjf:messages>\n";
        assert_eq!(XmlFormatter.format(&report.document, &config), expected);
        Ok(())
    }

    #[test]
    fn test_invalid_names_become_well_formed() -> Result<()> {
        let input = "BEGIN:VMSG\nCall me: now\n:orphan\nBEGIN:2ND PART\nEND:2ND PART\nEND:VMSG\n";
        let doc = parse_vmsg(input)?;
        let xml = format_xml(&doc);
        assert!(xml.contains("<VMSG Call_x0020_me=\" now\" _=\"orphan\">"));
        assert!(xml.contains("<_x0032_ND_x0020_PART/>"));
        assert!(!xml.contains("Call me="));
        Ok(())
    }

    #[test]
    fn test_empty_document_as_xml() {
        let doc = VmsgParser::new().parse_lines(Vec::<&str>::new()).unwrap();
        assert_eq!(format_xml(&doc), "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }

    #[test]
    fn test_fixture_reexported_as_vmg() -> Result<()> {
        let doc = parse_file(INBOX_MESSAGE, &ParserConfig::default())?;
        let vmg = format_vmsg(&doc);
        assert!(vmg.starts_with("BEGIN:VMSG\r\nVERSION:1.1\r\nX-IRMC-STATUS:READ\r\n"));
        assert!(vmg.ends_with("END:VENV\r\nEND:VMSG\r\n"));

        let reparsed = parse_vmsg(&vmg)?;
        assert!(documents_equal(&doc, &reparsed));
        Ok(())
    }

    #[test]
    fn test_body_text_with_colon_survives_vmg_export() -> Result<()> {
        let doc = parse_vmsg("BEGIN:VBODY\nDate:1\nCall me: now\nEND:VBODY\n")?;
        let reparsed = parse_vmsg(&format_vmsg(&doc))?;
        assert!(documents_equal(&doc, &reparsed));
        Ok(())
    }
}
