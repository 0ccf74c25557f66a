//! Relay in front of the Caoliao (cli.im) QR recognition service.
//!
//! `POST /decode_qrcode/` takes an image, uploads it upstream, asks the upstream
//! detector to read it and answers `{"content": ...}` or `{"error": ...}`.

pub mod config;

pub mod domain {
    pub mod qrcode {
        pub mod entity;
        pub mod errors;
        pub mod recognizer;
    }
}

pub mod application {
    pub mod decode_qrcode {
        pub mod dto;
        pub mod use_case;
    }
}

pub mod infrastructure {
    pub mod upstream {
        pub mod cliim_client;
        pub mod headers;
    }
}

pub mod presentation {
    pub mod http {
        pub mod errors;
        pub mod routes;
        pub mod state;

        pub mod handlers {
            pub mod decode;
            pub mod health;
        }

        pub mod middleware {
            pub mod logging;
            pub mod request_id;
        }
    }
}
