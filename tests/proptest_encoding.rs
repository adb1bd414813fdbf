use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bboxer::source::{EncodedPayload, ImageRef, ImageSource};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn local_file_base64_roundtrips(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("blob.bin");
        std::fs::write(&path, &bytes).expect("write file");

        let source = ImageSource::new(bboxer::api::agent());
        let payload = source.encode(&ImageRef::LocalPath(path)).expect("encode");
        let EncodedPayload::Base64(encoded) = payload else {
            panic!("local paths are sent inline");
        };

        let decoded = STANDARD.decode(encoded).expect("valid base64");
        prop_assert_eq!(decoded, bytes);
    }

    #[test]
    fn http_urls_stay_remote(host in "[a-z]{1,12}", file in "[a-z0-9]{1,12}", https in any::<bool>()) {
        let scheme = if https { "https" } else { "http" };
        let value = format!("{scheme}://{host}.example/{file}.jpg");
        let parsed: ImageRef = value.parse().expect("valid url");
        prop_assert!(matches!(parsed, ImageRef::RemoteUrl { .. }), "expected RemoteUrl");
        prop_assert_eq!(parsed.stem(), file);
    }
}
