//! Bundled stub modules for the framework and the standard exception
//! hierarchy, so error classes resolve without the real packages installed.
//!
//! A project module with the same name replaces its stub.

/// `(module name, is_package, source)` for every static stub.
const STATIC_STUBS: &[(&str, bool, &str)] = &[
    ("builtins", false, BUILTINS),
    ("starlette", true, ""),
    ("starlette.exceptions", false, STARLETTE_EXCEPTIONS),
    ("fastapi", true, FASTAPI),
    ("fastapi.applications", false, FASTAPI_APPLICATIONS),
    ("fastapi.exceptions", false, FASTAPI_EXCEPTIONS),
    ("fastapi.params", false, FASTAPI_PARAMS),
    ("fastapi.routing", false, FASTAPI_ROUTING),
    ("fastapi.status", false, "from starlette.status import *\n"),
];

/// All stub modules, `(name, is_package, source)`.
pub fn stub_modules() -> Vec<(&'static str, bool, String)> {
    let mut stubs: Vec<_> = STATIC_STUBS
        .iter()
        .map(|(name, package, source)| (*name, *package, source.to_string()))
        .collect();
    stubs.push(("starlette.status", false, status_module_source()));
    stubs
}

const BUILTINS: &str = r#"
class object:
    pass


class type:
    pass


class BaseException:
    def __init__(self, *args):
        self.args = args


class Exception(BaseException):
    pass


class GeneratorExit(BaseException):
    pass


class KeyboardInterrupt(BaseException):
    pass


class SystemExit(BaseException):
    pass


class ArithmeticError(Exception):
    pass


class ZeroDivisionError(ArithmeticError):
    pass


class AssertionError(Exception):
    pass


class AttributeError(Exception):
    pass


class LookupError(Exception):
    pass


class IndexError(LookupError):
    pass


class KeyError(LookupError):
    pass


class NameError(Exception):
    pass


class OSError(Exception):
    pass


class ConnectionError(OSError):
    pass


class FileNotFoundError(OSError):
    pass


class PermissionError(OSError):
    pass


class TimeoutError(OSError):
    pass


class RuntimeError(Exception):
    pass


class NotImplementedError(RuntimeError):
    pass


class RecursionError(RuntimeError):
    pass


class StopIteration(Exception):
    pass


class TypeError(Exception):
    pass


class ValueError(Exception):
    pass


class UnicodeError(ValueError):
    pass
"#;

const STARLETTE_EXCEPTIONS: &str = r#"
class HTTPException(Exception):
    def __init__(self, status_code, detail=None, headers=None):
        self.status_code = status_code
        self.detail = detail
        self.headers = headers


class WebSocketException(Exception):
    def __init__(self, code, reason=None):
        self.code = code
        self.reason = reason or ""
"#;

const FASTAPI: &str = r#"
from fastapi.applications import FastAPI
from fastapi.exceptions import HTTPException, WebSocketException
from fastapi.params import Depends, Security
from fastapi.routing import APIRouter
"#;

const FASTAPI_APPLICATIONS: &str = r#"
class FastAPI:
    def __init__(self, **extra):
        self.extra = extra
"#;

const FASTAPI_EXCEPTIONS: &str = r#"
from starlette.exceptions import HTTPException as StarletteHTTPException
from starlette.exceptions import WebSocketException as StarletteWebSocketException


class HTTPException(StarletteHTTPException):
    def __init__(self, status_code, detail=None, headers=None):
        super().__init__(status_code=status_code, detail=detail, headers=headers)


class WebSocketException(StarletteWebSocketException):
    def __init__(self, code, reason=None):
        super().__init__(code=code, reason=reason)
"#;

const FASTAPI_PARAMS: &str = r#"
class Depends:
    def __init__(self, dependency=None, *, use_cache=True):
        self.dependency = dependency
        self.use_cache = use_cache


class Security(Depends):
    def __init__(self, dependency=None, *, scopes=None, use_cache=True):
        super().__init__(dependency=dependency, use_cache=use_cache)
        self.scopes = scopes
"#;

const FASTAPI_ROUTING: &str = r#"
class APIRouter:
    def __init__(self, *, prefix="", tags=None, dependencies=None, include_in_schema=True, **extra):
        self.prefix = prefix
        self.include_in_schema = include_in_schema
"#;

/// `(code, constant suffix)` as exported by `starlette.status`.
const STATUS_CONSTANTS: &[(u16, &str)] = &[
    (100, "CONTINUE"),
    (101, "SWITCHING_PROTOCOLS"),
    (102, "PROCESSING"),
    (103, "EARLY_HINTS"),
    (200, "OK"),
    (201, "CREATED"),
    (202, "ACCEPTED"),
    (203, "NON_AUTHORITATIVE_INFORMATION"),
    (204, "NO_CONTENT"),
    (205, "RESET_CONTENT"),
    (206, "PARTIAL_CONTENT"),
    (207, "MULTI_STATUS"),
    (208, "ALREADY_REPORTED"),
    (226, "IM_USED"),
    (300, "MULTIPLE_CHOICES"),
    (301, "MOVED_PERMANENTLY"),
    (302, "FOUND"),
    (303, "SEE_OTHER"),
    (304, "NOT_MODIFIED"),
    (305, "USE_PROXY"),
    (306, "RESERVED"),
    (307, "TEMPORARY_REDIRECT"),
    (308, "PERMANENT_REDIRECT"),
    (400, "BAD_REQUEST"),
    (401, "UNAUTHORIZED"),
    (402, "PAYMENT_REQUIRED"),
    (403, "FORBIDDEN"),
    (404, "NOT_FOUND"),
    (405, "METHOD_NOT_ALLOWED"),
    (406, "NOT_ACCEPTABLE"),
    (407, "PROXY_AUTHENTICATION_REQUIRED"),
    (408, "REQUEST_TIMEOUT"),
    (409, "CONFLICT"),
    (410, "GONE"),
    (411, "LENGTH_REQUIRED"),
    (412, "PRECONDITION_FAILED"),
    (413, "REQUEST_ENTITY_TOO_LARGE"),
    (413, "CONTENT_TOO_LARGE"),
    (414, "REQUEST_URI_TOO_LONG"),
    (414, "URI_TOO_LONG"),
    (415, "UNSUPPORTED_MEDIA_TYPE"),
    (416, "REQUESTED_RANGE_NOT_SATISFIABLE"),
    (416, "RANGE_NOT_SATISFIABLE"),
    (417, "EXPECTATION_FAILED"),
    (418, "IM_A_TEAPOT"),
    (421, "MISDIRECTED_REQUEST"),
    (422, "UNPROCESSABLE_ENTITY"),
    (422, "UNPROCESSABLE_CONTENT"),
    (423, "LOCKED"),
    (424, "FAILED_DEPENDENCY"),
    (425, "TOO_EARLY"),
    (426, "UPGRADE_REQUIRED"),
    (428, "PRECONDITION_REQUIRED"),
    (429, "TOO_MANY_REQUESTS"),
    (431, "REQUEST_HEADER_FIELDS_TOO_LARGE"),
    (451, "UNAVAILABLE_FOR_LEGAL_REASONS"),
    (500, "INTERNAL_SERVER_ERROR"),
    (501, "NOT_IMPLEMENTED"),
    (502, "BAD_GATEWAY"),
    (503, "SERVICE_UNAVAILABLE"),
    (504, "GATEWAY_TIMEOUT"),
    (505, "HTTP_VERSION_NOT_SUPPORTED"),
    (506, "VARIANT_ALSO_NEGOTIATES"),
    (507, "INSUFFICIENT_STORAGE"),
    (508, "LOOP_DETECTED"),
    (510, "NOT_EXTENDED"),
    (511, "NETWORK_AUTHENTICATION_REQUIRED"),
];

const WS_CONSTANTS: &[(u16, &str)] = &[
    (1000, "NORMAL_CLOSURE"),
    (1001, "GOING_AWAY"),
    (1002, "PROTOCOL_ERROR"),
    (1003, "UNSUPPORTED_DATA"),
    (1005, "NO_STATUS_RCVD"),
    (1006, "ABNORMAL_CLOSURE"),
    (1007, "INVALID_FRAME_PAYLOAD_DATA"),
    (1008, "POLICY_VIOLATION"),
    (1009, "MESSAGE_TOO_BIG"),
    (1010, "MANDATORY_EXT"),
    (1011, "INTERNAL_ERROR"),
    (1012, "SERVICE_RESTART"),
    (1013, "TRY_AGAIN_LATER"),
    (1014, "BAD_GATEWAY"),
    (1015, "TLS_HANDSHAKE"),
];

fn status_module_source() -> String {
    let mut source = String::new();
    for (code, name) in STATUS_CONSTANTS {
        source.push_str(&format!("HTTP_{code}_{name} = {code}\n"));
    }
    for (code, name) in WS_CONSTANTS {
        source.push_str(&format!("WS_{code}_{name} = {code}\n"));
    }
    source
}

/// Standard reason phrase for an HTTP status code, the default `detail` of
/// an HTTP error raised without one.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a Teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        _ => return None,
    };
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_source_defines_constants() {
        let source = status_module_source();
        assert!(source.contains("HTTP_404_NOT_FOUND = 404\n"));
        assert!(source.contains("HTTP_422_UNPROCESSABLE_CONTENT = 422\n"));
        assert!(source.contains("WS_1008_POLICY_VIOLATION = 1008\n"));
    }

    #[test]
    fn reason_phrases_follow_the_standard_table() {
        assert_eq!(reason_phrase(404), Some("Not Found"));
        assert_eq!(reason_phrase(418), Some("I'm a Teapot"));
        assert_eq!(reason_phrase(449), None);
    }
}
