pub mod messages {

    pub const TOKEN_MISSING: &str = "Token không được cung cấp";

    pub const TOKEN_INVALID: &str = "Token không hợp lệ hoặc đã hết hạn";

    pub const LOGIN_FIELDS_REQUIRED: &str = "Vui lòng nhập tên đăng nhập và mật khẩu";

    /// Shared by unknown user, wrong password and inactive account.
    pub const INVALID_CREDENTIALS: &str = "Tên đăng nhập hoặc mật khẩu không đúng";

    pub const INTERNAL_ERROR: &str = "Lỗi máy chủ nội bộ";

    pub const UPSTREAM_FALLBACK: &str = "Có lỗi xảy ra khi xử lý yêu cầu";

    pub const UPSTREAM_UNREACHABLE: &str = "Không thể kết nối đến máy chủ chấm công";

    pub const EARLY_CHECKOUT: &str = "Giờ ra phải sau giờ vào";

    pub const TRANSACTION_NOT_FOUND: &str = "Không tìm thấy giao dịch";
}

pub mod token {

    pub const DEFAULT_TTL_HOURS: i64 = 24;
}

pub mod pagination {

    pub const DEFAULT_PAGE: u64 = 1;

    pub const DEFAULT_LIMIT: u64 = 20;

    pub const MAX_LIMIT: u64 = 100;
}

pub mod stats {

    pub const TOP_BANKS: u64 = 5;
}
