//! 페이지 단위 조회 타입.

use serde::{Deserialize, Serialize};

/// 페이지 요청 (0부터 시작하는 페이지 번호).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// 새 페이지 요청 생성.
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// 건너뛸 항목 수.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// 전체 항목 수에 대한 총 페이지 수.
    ///
    /// `size`가 0이면 0을 반환합니다. 호출자는 그 전에 요청을 검증해야 합니다.
    pub fn total_pages(&self, total: u64) -> u32 {
        if self.size == 0 {
            return 0;
        }
        let size = u64::from(self.size);
        u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX)
    }
}

/// 페이지 조회 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 현재 페이지의 항목
    pub items: Vec<T>,
    /// 총 페이지 수
    pub total_pages: u32,
    /// 요청한 페이지 번호
    pub page: u32,
    /// 요청한 페이지 크기
    pub size: u32,
    /// 전체 항목 수
    pub total: u64,
}

impl<T> Page<T> {
    /// 요청과 전체 개수로부터 페이지 생성.
    pub fn new(request: PageRequest, items: Vec<T>, total: u64) -> Self {
        Self {
            items,
            total_pages: request.total_pages(total),
            page: request.page,
            size: request.size,
            total,
        }
    }

    /// 항목 타입 변환.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}
